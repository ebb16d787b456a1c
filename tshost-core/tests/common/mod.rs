use std::cell::Cell;
use std::sync::Arc;

use tshost_core::engine::{Checker, EmitResult, Program};
use tshost_core::{CompilerHost, CompilerOptions, Diagnostic, Engine, PassthroughEngine, SourceFile};

pub const CANNOT_FIND_NAME: u32 = 2304;

pub const SHIP: &str = "module Navy { export class Ship { isSunk: boolean; } }\n";
pub const FLEET: &str =
    "///<reference path=\"ship.ts\" />\nmodule Navy { export class Fleet { ships: Ship[] } }\n";

/// Passthrough emission plus one semantic rule: identifiers on the deny list
/// are reported as unknown names.
pub struct CheckingEngine {
    unknown: Vec<String>,
}

impl CheckingEngine {
    pub fn new(unknown: &[&str]) -> Self {
        CheckingEngine {
            unknown: unknown.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl Engine for CheckingEngine {
    fn create_program(
        &self,
        files: &[String],
        options: &CompilerOptions,
        host: &mut dyn CompilerHost,
    ) -> Box<dyn Program> {
        Box::new(CheckingProgram {
            inner: PassthroughEngine.create_program(files, options, host),
            unknown: self.unknown.clone(),
        })
    }
}

struct CheckingProgram {
    inner: Box<dyn Program>,
    unknown: Vec<String>,
}

impl Program for CheckingProgram {
    fn source_files(&self) -> &[Arc<SourceFile>] {
        self.inner.source_files()
    }

    fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.diagnostics()
    }

    fn type_checker(&self, full_type_check: bool) -> Box<dyn Checker + '_> {
        Box::new(CheckingChecker {
            inner: self.inner.type_checker(full_type_check),
            program: self,
            full_type_check,
        })
    }
}

struct CheckingChecker<'p> {
    inner: Box<dyn Checker + 'p>,
    program: &'p CheckingProgram,
    full_type_check: bool,
}

impl Checker for CheckingChecker<'_> {
    fn diagnostics(&mut self) -> Vec<Diagnostic> {
        if !self.full_type_check {
            return Vec::new();
        }
        let mut found = Vec::new();
        for file in self.program.source_files() {
            if file.is_declaration() {
                continue;
            }
            let mut in_file = Vec::new();
            for name in &self.program.unknown {
                for (start, _) in file.text().match_indices(name.as_str()) {
                    if is_whole_word(file.text(), start, name.len()) {
                        in_file.push(
                            Diagnostic::error(
                                CANNOT_FIND_NAME,
                                format!("Cannot find name '{name}'."),
                            )
                            .at(Arc::clone(file), start, name.len()),
                        );
                    }
                }
            }
            in_file.sort_by_key(|diagnostic: &Diagnostic| diagnostic.start);
            found.extend(in_file);
        }
        found
    }

    fn emit_files(&mut self, host: &mut dyn CompilerHost) -> EmitResult {
        self.inner.emit_files(host)
    }
}

fn is_whole_word(text: &str, start: usize, length: usize) -> bool {
    let is_ident = |ch: char| ch.is_alphanumeric() || ch == '_' || ch == '$';
    let before = text[..start].chars().next_back().is_none_or(|ch| !is_ident(ch));
    let after = text[start + length..].chars().next().is_none_or(|ch| !is_ident(ch));
    before && after
}

/// Passthrough engine that counts how many programs it was asked to build.
#[derive(Default)]
pub struct CountingEngine {
    programs: Cell<usize>,
}

impl CountingEngine {
    pub fn programs(&self) -> usize {
        self.programs.get()
    }
}

impl Engine for CountingEngine {
    fn create_program(
        &self,
        files: &[String],
        options: &CompilerOptions,
        host: &mut dyn CompilerHost,
    ) -> Box<dyn Program> {
        self.programs.set(self.programs.get() + 1);
        PassthroughEngine.create_program(files, options, host)
    }
}
