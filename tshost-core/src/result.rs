//! Collecting what one compilation run produced.

use std::collections::BTreeMap;

use crate::diagnostic::{Diagnostic, DiagnosticCategory};
use crate::engine::SourceMapData;

/// What a diagnostic callback wants done with the default report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Let the default report (a log record) go out as well.
    #[default]
    Report,
    /// The callback handled it; skip the default report.
    Suppress,
}

/// Called once per diagnostic, in emission order, with the raw record and
/// its rendered line.
pub type DiagnosticCallback<'a> = dyn FnMut(&Diagnostic, &str) -> Disposition + 'a;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationResult {
    /// Every output the host recorded, by name.
    pub outputs: BTreeMap<String, String>,
    pub source_maps: Vec<SourceMapData>,
    /// Rendered diagnostics in the order the engine produced them.
    pub diagnostics: Vec<String>,
}

impl CompilationResult {
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty() && self.source_maps.is_empty() && self.diagnostics.is_empty()
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Formats diagnostics as they arrive, streams them to the caller's
/// callback and keeps the rendered lines for the final result.
pub(crate) struct DiagnosticReporter<'r, 'cb> {
    callback: Option<&'r mut DiagnosticCallback<'cb>>,
    rendered: Vec<String>,
}

impl<'r, 'cb> DiagnosticReporter<'r, 'cb> {
    pub(crate) fn new(callback: Option<&'r mut DiagnosticCallback<'cb>>) -> Self {
        DiagnosticReporter {
            callback,
            rendered: Vec::new(),
        }
    }

    pub(crate) fn forward(&mut self, batch: Vec<Diagnostic>) {
        for diagnostic in batch {
            let formatted = diagnostic.format();
            let disposition = match self.callback.as_mut() {
                Some(callback) => callback(&diagnostic, &formatted),
                None => Disposition::Report,
            };
            if disposition == Disposition::Report {
                report(&diagnostic, &formatted);
            }
            self.rendered.push(formatted);
        }
    }

    pub(crate) fn finish(self) -> Vec<String> {
        self.rendered
    }
}

fn report(diagnostic: &Diagnostic, formatted: &str) {
    let level = match diagnostic.category {
        DiagnosticCategory::Error => log::Level::Error,
        DiagnosticCategory::Warning => log::Level::Warn,
        DiagnosticCategory::Message => log::Level::Info,
    };
    log::log!(target: "tshost::diagnostic", level, "{formatted}");
}
