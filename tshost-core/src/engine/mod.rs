//! The contract between this crate and a compiler engine.
//!
//! An engine owns parsing, checking and emission. It reaches sources and
//! output destinations only through a [`CompilerHost`], which is what lets
//! the same engine compile files on disk or strings in memory.

pub mod passthrough;

use std::sync::Arc;

use crate::args::{self, CompilerOptions, ParsedCommandLine};
use crate::diagnostic::{Diagnostic, SourceFile};
use crate::error::HostError;

pub use passthrough::PassthroughEngine;

/// Environment services an engine needs while building and emitting a
/// program.
pub trait CompilerHost {
    /// Source text for `name`, or `Ok(None)` when there is no such source.
    ///
    /// An `Err` is a per-file failure; the engine reports it as a diagnostic
    /// and keeps going.
    fn read_source(&mut self, name: &str) -> Result<Option<String>, HostError>;

    fn write_file(
        &mut self,
        name: &str,
        data: &str,
        write_byte_order_mark: bool,
    ) -> Result<(), HostError>;

    fn current_directory(&mut self) -> Result<String, HostError>;

    fn default_library(&self) -> String;

    fn canonical_file_name(&self, name: &str) -> String;

    fn use_case_sensitive_file_names(&self) -> bool;

    fn new_line(&self) -> &str;
}

pub trait Engine {
    fn parse_arguments(&self, args: &[String]) -> ParsedCommandLine {
        args::parse_command_line(args)
    }

    /// Build a program from root `files`, reading every source through `host`.
    fn create_program(
        &self,
        files: &[String],
        options: &CompilerOptions,
        host: &mut dyn CompilerHost,
    ) -> Box<dyn Program>;
}

pub trait Program {
    fn source_files(&self) -> &[Arc<SourceFile>];

    /// Early diagnostics: unreadable or missing files, structural errors.
    fn diagnostics(&self) -> Vec<Diagnostic>;

    fn type_checker(&self, full_type_check: bool) -> Box<dyn Checker + '_>;
}

pub trait Checker {
    /// Semantic diagnostics.
    fn diagnostics(&mut self) -> Vec<Diagnostic>;

    /// Write every output through `host`.
    fn emit_files(&mut self, host: &mut dyn CompilerHost) -> EmitResult;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitResult {
    pub diagnostics: Vec<Diagnostic>,
    pub source_maps: Vec<SourceMapData>,
}

/// A source map produced during emission, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapData {
    pub output_file: String,
    pub map_file: String,
    pub json: String,
}
