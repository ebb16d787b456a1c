//! An engine that emits its sources verbatim.
//!
//! `PassthroughEngine` does no language analysis. It follows
//! `/// <reference path="..." />` directives to build the file list, reports
//! files it cannot find or read, and writes every non-declaration source
//! unchanged: one `.js` file per source, or a single concatenated file with
//! `--out`. With `--sourcemap` each output gets a line-for-line source map.

use std::collections::HashSet;
use std::slice;
use std::sync::Arc;

use serde_json::json;

use super::{Checker, CompilerHost, EmitResult, Engine, Program, SourceMapData};
use crate::args::CompilerOptions;
use crate::diagnostic::{Diagnostic, SourceFile};
use crate::error::HostError;
use crate::path;

pub const FILE_NOT_FOUND: u32 = 6053;
pub const CANNOT_READ_FILE: u32 = 5012;
pub const COULD_NOT_WRITE_FILE: u32 = 5033;

const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEngine;

impl Engine for PassthroughEngine {
    fn create_program(
        &self,
        files: &[String],
        options: &CompilerOptions,
        host: &mut dyn CompilerHost,
    ) -> Box<dyn Program> {
        let mut builder = ProgramBuilder {
            host,
            options,
            seen: HashSet::new(),
            files: Vec::new(),
            diagnostics: Vec::new(),
        };
        if let Some(library) = options.default_library.as_deref().filter(|_| !options.no_lib) {
            builder.process_file(library, None);
        }
        for file in files {
            builder.process_file(file, None);
        }
        log::debug!(
            "program built with {} file(s) and {} diagnostic(s)",
            builder.files.len(),
            builder.diagnostics.len()
        );
        Box::new(PassthroughProgram {
            options: options.clone(),
            files: builder.files,
            diagnostics: builder.diagnostics,
        })
    }
}

struct Referrer {
    file: Arc<SourceFile>,
    start: usize,
    length: usize,
}

struct ProgramBuilder<'h, 'o> {
    host: &'h mut dyn CompilerHost,
    options: &'o CompilerOptions,
    seen: HashSet<String>,
    files: Vec<Arc<SourceFile>>,
    diagnostics: Vec<Diagnostic>,
}

impl ProgramBuilder<'_, '_> {
    /// Referenced files are added before the file that references them.
    fn process_file(&mut self, name: &str, referrer: Option<Referrer>) {
        let name = path::normalize(name);
        if !self.seen.insert(self.host.canonical_file_name(&name)) {
            return;
        }
        match self.host.read_source(&name) {
            Ok(Some(text)) => {
                let file = Arc::new(SourceFile::new(name, text));
                if !self.options.no_resolve {
                    let directory = path::directory_of(file.name()).to_string();
                    for reference in reference_directives(file.text()) {
                        let target = path::combine(&directory, &reference.path);
                        let referrer = Referrer {
                            file: Arc::clone(&file),
                            start: reference.start,
                            length: reference.length,
                        };
                        self.process_file(&target, Some(referrer));
                    }
                }
                self.files.push(file);
            }
            Ok(None) => self.report(
                referrer,
                Diagnostic::error(FILE_NOT_FOUND, format!("File '{name}' not found.")),
            ),
            Err(err) => self.report(
                referrer,
                Diagnostic::error(
                    CANNOT_READ_FILE,
                    format!("Cannot read file '{name}': {}.", err.reason()),
                ),
            ),
        }
    }

    fn report(&mut self, referrer: Option<Referrer>, diagnostic: Diagnostic) {
        let diagnostic = match referrer {
            Some(referrer) => diagnostic.at(referrer.file, referrer.start, referrer.length),
            None => diagnostic,
        };
        self.diagnostics.push(diagnostic);
    }
}

struct PassthroughProgram {
    options: CompilerOptions,
    files: Vec<Arc<SourceFile>>,
    diagnostics: Vec<Diagnostic>,
}

impl Program for PassthroughProgram {
    fn source_files(&self) -> &[Arc<SourceFile>] {
        &self.files
    }

    fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.clone()
    }

    fn type_checker(&self, _full_type_check: bool) -> Box<dyn Checker + '_> {
        Box::new(PassthroughChecker { program: self })
    }
}

struct PassthroughChecker<'p> {
    program: &'p PassthroughProgram,
}

impl Checker for PassthroughChecker<'_> {
    fn diagnostics(&mut self) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn emit_files(&mut self, host: &mut dyn CompilerHost) -> EmitResult {
        let options = &self.program.options;
        let emitted: Vec<&SourceFile> = self
            .program
            .files
            .iter()
            .map(Arc::as_ref)
            .filter(|file| !file.is_declaration())
            .collect();

        let mut result = EmitResult::default();
        match &options.out {
            Some(out) if !emitted.is_empty() => {
                emit_output(host, options, out, &emitted, &mut result);
            }
            Some(_) => {}
            None => {
                for file in &emitted {
                    let out = output_name(file.name(), options.out_dir.as_deref());
                    emit_output(host, options, &out, slice::from_ref(file), &mut result);
                }
            }
        }
        result
    }
}

fn emit_output(
    host: &mut dyn CompilerHost,
    options: &CompilerOptions,
    name: &str,
    files: &[&SourceFile],
    result: &mut EmitResult,
) {
    let new_line = host.new_line().to_string();
    let mut text = String::new();
    for file in files {
        text.push_str(file.text());
        if !file.text().is_empty() && !file.text().ends_with('\n') {
            text.push_str(&new_line);
        }
    }

    let map_file = format!("{name}.map");
    if options.source_map {
        text.push_str(&format!(
            "//# sourceMappingURL={}{new_line}",
            path::file_name(&map_file)
        ));
    }

    if let Err(err) = host.write_file(name, &text, false) {
        result.diagnostics.push(write_error(name, &err));
    }

    if options.source_map {
        let json = source_map_json(name, files);
        match host.write_file(&map_file, &json, false) {
            Ok(()) => result.source_maps.push(SourceMapData {
                output_file: name.to_string(),
                map_file,
                json,
            }),
            Err(err) => result.diagnostics.push(write_error(&map_file, &err)),
        }
    }
}

fn write_error(name: &str, err: &HostError) -> Diagnostic {
    Diagnostic::error(
        COULD_NOT_WRITE_FILE,
        format!("Could not write file '{name}': {}.", err.reason()),
    )
}

fn output_name(source: &str, out_dir: Option<&str>) -> String {
    let stem = source
        .strip_suffix(".tsx")
        .or_else(|| source.strip_suffix(".ts"))
        .unwrap_or(source);
    let output = format!("{stem}.js");
    match out_dir {
        Some(dir) if path::is_rooted(&output) => path::combine(dir, path::file_name(&output)),
        Some(dir) => path::combine(dir, &output),
        None => output,
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Reference {
    path: String,
    start: usize,
    length: usize,
}

/// `/// <reference path="..." />` directives in the leading comment block.
fn reference_directives(text: &str) -> Vec<Reference> {
    let mut references = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("///") {
            if let Some(path) = reference_path(rest) {
                references.push(Reference {
                    path,
                    start: offset + (line.len() - trimmed.len()),
                    length: trimmed.trim_end().len(),
                });
            }
        } else if !trimmed.is_empty() && !trimmed.starts_with("//") {
            break;
        }
        offset += line.len();
    }
    references
}

fn reference_path(directive: &str) -> Option<String> {
    let rest = directive.trim_start().strip_prefix("<reference")?;
    let attribute = rest.find("path")?;
    let value = rest[attribute + "path".len()..]
        .trim_start()
        .strip_prefix('=')?
        .trim_start();
    let quote = value.chars().next().filter(|ch| *ch == '"' || *ch == '\'')?;
    let body = &value[1..];
    let end = body.find(quote)?;
    Some(body[..end].to_string())
}

fn source_map_json(output: &str, files: &[&SourceFile]) -> String {
    let sources: Vec<&str> = files.iter().map(|file| file.name()).collect();
    json!({
        "version": 3,
        "file": path::file_name(output),
        "sourceRoot": "",
        "sources": sources,
        "names": [],
        "mappings": identity_mappings(files),
    })
    .to_string()
}

/// Maps generated line `n` of each file's slice to source line `n`, column 0.
fn identity_mappings(files: &[&SourceFile]) -> String {
    let mut lines = Vec::new();
    let (mut previous_source, mut previous_line) = (0_i64, 0_i64);
    for (index, file) in files.iter().enumerate() {
        let source = index as i64;
        for line in 0..file.text().lines().count() as i64 {
            let mut segment = String::new();
            for value in [0, source - previous_source, line - previous_line, 0] {
                encode_vlq(value, &mut segment);
            }
            previous_source = source;
            previous_line = line;
            lines.push(segment);
        }
    }
    lines.join(";")
}

fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & 0b1_1111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b10_0000;
        }
        out.push(BASE64_DIGITS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}
