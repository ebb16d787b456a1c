//! Engine diagnostics and their command-line rendering.
//!
//! A rendered diagnostic looks exactly like the wrapped compiler's own
//! batch output:
//!
//! ```text
//! a.ts(3,5): error TS2304: Cannot find name 'X'.
//! error TS5023: Unknown compiler option 'bogus'.
//! ```

use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

impl DiagnosticCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Message => "message",
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source file as the engine saw it, with a line table for positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    name: String,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        SourceFile {
            name: name.into(),
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_declaration(&self) -> bool {
        self.name.ends_with(".d.ts")
    }

    /// 1-based line and character of a byte offset.
    ///
    /// Characters are counted in UTF-16 code units, matching the engine's
    /// own column numbers.
    pub fn line_and_character(&self, position: usize) -> (usize, usize) {
        let position = position.min(self.text.len());
        let line = match self.line_starts.binary_search(&position) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let character = match self.text.get(start..position) {
            Some(prefix) => prefix.encode_utf16().count(),
            None => position - start,
        };
        (line + 1, character + 1)
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut starts = vec![0];
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\r' if bytes.get(index + 1) == Some(&b'\n') => {
                index += 2;
                starts.push(index);
            }
            b'\r' | b'\n' => {
                index += 1;
                starts.push(index);
            }
            _ => index += 1,
        }
    }
    starts
}

/// One structured record reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: Option<Arc<SourceFile>>,
    pub start: usize,
    pub length: usize,
    pub category: DiagnosticCategory,
    pub code: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(category: DiagnosticCategory, code: u32, message: impl Into<String>) -> Self {
        Diagnostic {
            file: None,
            start: 0,
            length: 0,
            category,
            code,
            message: message.into(),
        }
    }

    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Diagnostic::new(DiagnosticCategory::Error, code, message)
    }

    pub fn warning(code: u32, message: impl Into<String>) -> Self {
        Diagnostic::new(DiagnosticCategory::Warning, code, message)
    }

    pub fn at(mut self, file: Arc<SourceFile>, start: usize, length: usize) -> Self {
        self.file = Some(file);
        self.start = start;
        self.length = length;
        self
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file.as_deref().map(SourceFile::name)
    }

    pub fn format(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            let (line, character) = file.line_and_character(self.start);
            write!(f, "{}({line},{character}): ", file.name())?;
        }
        write!(f, "{} TS{}: {}", self.category, self.code, self.message)
    }
}
