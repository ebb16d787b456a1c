mod common;

use std::collections::HashMap;
use std::fs;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use common::{CheckingEngine, CountingEngine, FLEET, SHIP};
use tshost_core::{
    CompileError, Compiler, CompilerConfig, Diagnostic, Disposition, SourceDescriptor, VirtualHost,
};

fn config() -> CompilerConfig {
    CompilerConfig::default()
}

#[test]
fn cross_references_resolve_between_strings() {
    let compiler = Compiler::default();
    let result = compiler
        .compile_strings(
            [("fleet.ts", FLEET), ("ship.ts", SHIP)],
            "",
            &config(),
            None,
        )
        .unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(
        result.outputs.keys().collect::<Vec<_>>(),
        vec!["fleet.js", "ship.js"]
    );
}

#[test]
fn missing_reference_is_one_early_error() {
    let compiler = Compiler::default();
    let result = compiler
        .compile_strings([("fleet.ts", FLEET)], "", &config(), None)
        .unwrap();
    assert_eq!(
        result.diagnostics,
        vec!["fleet.ts(1,1): error TS6053: File 'ship.ts' not found."]
    );
    assert!(result.outputs.is_empty());
}

#[test]
fn early_errors_still_emit_without_full_check() {
    let compiler = Compiler::default();
    let config = CompilerConfig::default().with_full_type_check(false);
    let result = compiler
        .compile_strings([("fleet.ts", FLEET)], "", &config, None)
        .unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.outputs["fleet.js"], FLEET);
}

#[test]
fn empty_string_never_reaches_the_engine() {
    let compiler = Compiler::new(CountingEngine::default());
    for _ in 0..2 {
        let output = compiler
            .compile_string("", "--bogus", &config(), None)
            .unwrap();
        assert_eq!(output, "");
    }
    assert_eq!(compiler.engine().programs(), 0);
}

#[test]
fn repeated_compilations_match() {
    let compiler = Compiler::default();
    let first = compiler
        .compile_strings([("fleet.ts", FLEET), ("ship.ts", SHIP)], "--out navy.js", &config(), None)
        .unwrap();
    let second = compiler
        .compile_strings([("ship.ts", SHIP), ("fleet.ts", FLEET)], "--out navy.js", &config(), None)
        .unwrap();
    assert_eq!(first.outputs["navy.js"], format!("{SHIP}{FLEET}"));
    assert_eq!(first, second);
}

#[test]
fn semantic_errors_only_in_full_mode() {
    let compiler = Compiler::new(CheckingEngine::new(&["SomeFakeType"]));
    let source = "var a : SomeFakeType";

    let mut seen = Vec::new();
    let output = compiler
        .compile_string(
            source,
            "",
            &CompilerConfig::default().with_full_type_check(false),
            Some(&mut |_: &Diagnostic, line: &str| {
                seen.push(line.to_string());
                Disposition::Suppress
            }),
        )
        .unwrap();
    assert!(seen.is_empty());
    assert_eq!(output, format!("{source}\n"));

    let output = compiler
        .compile_string(
            source,
            "",
            &config(),
            Some(&mut |_: &Diagnostic, line: &str| {
                seen.push(line.to_string());
                Disposition::Suppress
            }),
        )
        .unwrap();
    assert_eq!(
        seen,
        vec!["string.ts(1,9): error TS2304: Cannot find name 'SomeFakeType'."]
    );
    assert_eq!(output, format!("{source}\n"));
}

#[test]
fn suppressed_diagnostics_stay_in_the_result() {
    let compiler = Compiler::new(CheckingEngine::new(&["Missing"]));
    let mut codes = Vec::new();
    let result = compiler
        .compile_strings(
            [("a.ts", "var a: Missing;\n"), ("b.ts", "var b: Missing;\n")],
            "",
            &config(),
            Some(&mut |diagnostic: &Diagnostic, _: &str| {
                codes.push(diagnostic.code);
                Disposition::Suppress
            }),
        )
        .unwrap();
    assert_eq!(codes, vec![2304, 2304]);
    assert_eq!(
        result.diagnostics,
        vec![
            "a.ts(1,8): error TS2304: Cannot find name 'Missing'.",
            "b.ts(1,8): error TS2304: Cannot find name 'Missing'.",
        ]
    );
}

#[test]
fn passthrough_round_trips_source_text() {
    let compiler = Compiler::default();
    let mut sources = HashMap::new();
    sources.insert("one.ts".to_string(), "var one = 1;\n".to_string());
    sources.insert("two.ts".to_string(), "var two = 2;\n".to_string());
    let result = compiler
        .compile_strings(sources.clone(), "", &config(), None)
        .unwrap();
    for (name, text) in &sources {
        let output = name.replace(".ts", ".js");
        assert_eq!(&result.outputs[&output], text);
    }
}

#[test]
fn reused_host_accumulates_outputs() {
    let compiler = Compiler::default();
    let config = config();
    let mut host = VirtualHost::new(config.clone());
    host.read_from_strings(false).write_to_strings();

    let first = compiler
        .compile_with_host(
            &mut host,
            vec![SourceDescriptor::from_named_string("a.ts", "var a;\n")],
            "",
            &config,
            None,
        )
        .unwrap();
    assert_eq!(first.outputs.len(), 1);

    let second = compiler
        .compile_with_host(
            &mut host,
            vec![SourceDescriptor::from_named_string("b.ts", "var b;\n")],
            "",
            &config,
            None,
        )
        .unwrap();
    assert_eq!(
        second.outputs.keys().collect::<Vec<_>>(),
        vec!["a.js", "b.js"]
    );

    let fresh = compiler
        .compile_strings([("b.ts", "var b;\n")], "", &config, None)
        .unwrap();
    assert_eq!(fresh.outputs.keys().collect::<Vec<_>>(), vec!["b.js"]);
}

#[test]
fn file_compilation_creates_nested_output_directories() {
    let dir = tempdir().unwrap();
    let ship = dir.path().join("ship.ts");
    let fleet = dir.path().join("fleet.ts");
    fs::write(&ship, SHIP).unwrap();
    fs::write(&fleet, FLEET).unwrap();
    let out = dir.path().join("build").join("deep").join("navy.js");

    let compiler = Compiler::default();
    let result = compiler
        .compile(
            fleet.clone(),
            vec!["--out".to_string(), out.to_string_lossy().into_owned()],
            &config(),
            None,
        )
        .unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(fs::read_to_string(&out).unwrap(), format!("{SHIP}{FLEET}"));
}

#[test]
fn unknown_option_is_reported() {
    let compiler = Compiler::default();
    let result = compiler
        .compile_strings([("a.ts", "var a;\n")], "--bogus", &config(), None)
        .unwrap();
    assert_eq!(
        result.diagnostics,
        vec!["error TS5023: Unknown compiler option 'bogus'."]
    );
}

#[test]
fn no_lib_skips_a_missing_default_library() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.d.ts");
    let config = CompilerConfig::default().with_default_library(&missing);
    let compiler = Compiler::default();

    let result = compiler
        .compile_strings([("a.ts", "var a;\n")], "--noLib", &config, None)
        .unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.outputs["a.js"], "var a;\n");

    let result = compiler
        .compile_strings([("a.ts", "var a;\n")], "", &config, None)
        .unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].starts_with("error TS6053: File '"));
    assert!(result.diagnostics[0].ends_with("missing.d.ts' not found."));
}

#[test]
fn rejects_malformed_input() {
    let compiler = Compiler::default();
    let config = config();

    let err = compiler
        .compile(Vec::<String>::new(), "", &config, None)
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidInput(_)));

    let err = compiler
        .compile_string(SourceDescriptor::from_file("a.ts"), "", &config, None)
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidInput(_)));

    let err = compiler
        .compile_strings(
            vec![
                SourceDescriptor::from_named_string("a.ts", "1"),
                SourceDescriptor::from_named_string("a.ts", "2"),
            ],
            "",
            &config,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidInput(_)));
}

#[test]
fn source_maps_are_returned_and_written() {
    let compiler = Compiler::default();
    let result = compiler
        .compile_strings(
            [("a.ts", "var a;\nvar b;\n")],
            "--sourcemap --outDir build",
            &config(),
            None,
        )
        .unwrap();
    assert_eq!(result.source_maps.len(), 1);
    let map = &result.source_maps[0];
    assert_eq!(map.output_file, "build/a.js");
    assert_eq!(result.outputs["build/a.js.map"], map.json);
    assert!(result.outputs["build/a.js"].contains("//# sourceMappingURL=a.js.map"));
}

#[test]
fn response_file_supplies_options() {
    let dir = tempdir().unwrap();
    let response = dir.path().join("args.txt");
    fs::write(&response, "--out \"combined.js\"\n--noResolve\n").unwrap();

    let compiler = Compiler::default();
    let result = compiler
        .compile_strings(
            [("fleet.ts", FLEET)],
            format!("@{}", response.display()),
            &config(),
            None,
        )
        .unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(result.outputs["combined.js"], FLEET);
}

#[test]
fn string_host_can_fall_back_to_disk() {
    let dir = tempdir().unwrap();
    let ship = dir.path().join("ship.ts");
    fs::write(&ship, SHIP).unwrap();

    let config = config();
    let mut host = VirtualHost::new(config.clone());
    host.read_from_strings(true).write_to_strings();
    let fleet = format!(
        "///<reference path=\"{}\" />\nvar fleet;\n",
        ship.display()
    );
    let result = Compiler::default()
        .compile_with_host(
            &mut host,
            vec![SourceDescriptor::from_named_string("fleet.ts", fleet)],
            "--out navy.js",
            &config,
            None,
        )
        .unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert!(result.outputs["navy.js"].starts_with(SHIP));
}

#[test]
fn compile_string_output_compiles_to_itself() {
    let compiler = Compiler::default();
    let first = compiler
        .compile_string("var a = 1", "", &config(), None)
        .unwrap();
    assert_eq!(first, "var a = 1\n");

    let second = compiler
        .compile_string(first.as_str(), "", &config(), None)
        .unwrap();
    assert_eq!(second, first);
}

#[test]
fn failed_writes_are_reported_and_do_not_stop_emission() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.ts");
    let b = dir.path().join("b.ts");
    fs::write(&a, "var a;\n").unwrap();
    fs::write(&b, "var b;\n").unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "a file, not a directory").unwrap();

    let result = Compiler::default()
        .compile(
            vec![a, b],
            vec![
                "--outDir".to_string(),
                blocker.join("out").to_string_lossy().into_owned(),
            ],
            &config(),
            None,
        )
        .unwrap();
    assert_eq!(result.diagnostics.len(), 2, "{:?}", result.diagnostics);
    for (diagnostic, output) in result.diagnostics.iter().zip(["a.js", "b.js"]) {
        assert!(
            diagnostic.starts_with("error TS5033: Could not write file '"),
            "{diagnostic}"
        );
        assert!(diagnostic.contains(&format!("/out/{output}': ")), "{diagnostic}");
    }
    assert!(result.outputs.is_empty());
}

#[test]
fn unreadable_sources_are_reported_and_the_run_continues() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.ts");
    fs::write(&a, "var a;\n").unwrap();
    let folder = dir.path().join("folder.ts");
    fs::create_dir(&folder).unwrap();

    let config = config().with_full_type_check(false);
    let result = Compiler::default()
        .compile(
            vec![folder, a],
            vec!["--outDir".to_string(), dir.path().join("build").to_string_lossy().into_owned()],
            &config,
            None,
        )
        .unwrap();
    assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
    assert!(
        result.diagnostics[0].starts_with("error TS5012: Cannot read file '"),
        "{}",
        result.diagnostics[0]
    );
    assert!(result.diagnostics[0].contains("folder.ts': "));
    let outputs: Vec<&String> = result.outputs.keys().collect();
    assert_eq!(outputs.len(), 1);
    assert!(outputs[0].ends_with("build/a.js"), "{outputs:?}");
    assert_eq!(
        fs::read_to_string(dir.path().join("build").join("a.js")).unwrap(),
        "var a;\n"
    );
}
