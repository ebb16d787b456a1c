use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tshost_core::{
    Compiler, CompilerConfig, Diagnostic, DiagnosticCallback, Disposition, SourceDescriptor,
    VirtualHost, discover,
};

/// Compile TypeScript sources through the hosted engine.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source files, or directories to search for `.ts`/`.tsx` files
    inputs: Vec<PathBuf>,

    #[arg(long, help = "Compile standard input and print the output")]
    stdin: bool,

    #[arg(long, help = "Print outputs to stdout instead of writing files")]
    print: bool,

    #[arg(
        long,
        value_name = "PATH",
        help = "Default library to load (defaults to the bundled lib.d.ts)"
    )]
    lib: Option<PathBuf>,

    #[arg(long, help = "Skip semantic checking; only early errors are reported")]
    no_type_check: bool,

    /// Arguments passed to the engine unchanged, e.g. `-- --out all.js`
    #[arg(last = true, value_name = "ENGINE_ARGS")]
    engine_args: Vec<String>,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let mut config = CompilerConfig::new().with_full_type_check(!cli.no_type_check);
    if let Some(lib) = &cli.lib {
        config = config.with_default_library(lib);
    }

    let mut reported = 0usize;
    let mut report = |_: &Diagnostic, line: &str| {
        eprintln!("{line}");
        reported += 1;
        Disposition::Suppress
    };
    compile_inputs(&cli, &config, &mut report)?;

    log::info!("{reported} diagnostic(s) reported");
    Ok(if reported == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn compile_inputs(
    cli: &Cli,
    config: &CompilerConfig,
    on_diagnostic: &mut DiagnosticCallback<'_>,
) -> Result<()> {
    let compiler = Compiler::default();
    let args = cli.engine_args.clone();

    if cli.stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read standard input")?;
        let output = compiler.compile_string(buffer, args, config, Some(on_diagnostic))?;
        print!("{output}");
        return Ok(());
    }

    let sources = collect_sources(&cli.inputs)?;
    if sources.is_empty() {
        bail!("no input files");
    }

    if cli.print {
        let mut host = VirtualHost::new(config.clone());
        host.read_from_files().write_to_strings();
        let result = compiler.compile_with_host(&mut host, sources, args, config, Some(on_diagnostic))?;
        for text in result.outputs.values() {
            print!("{text}");
        }
    } else {
        let names: Vec<String> = sources
            .iter()
            .map(|source| source.name().to_string())
            .collect();
        let result = compiler.compile(names, args, config, Some(on_diagnostic))?;
        for name in result.outputs.keys() {
            log::info!("wrote {name}");
        }
    }
    Ok(())
}

fn collect_sources(inputs: &[PathBuf]) -> Result<Vec<SourceDescriptor>> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = discover(input)
                .with_context(|| format!("failed to search {}", input.display()))?;
            sources.extend(found);
        } else {
            sources.push(SourceDescriptor::from_file(input));
        }
    }
    Ok(sources)
}
