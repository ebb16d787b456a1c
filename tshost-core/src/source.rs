//! Compilation inputs, either backed by a file or held in memory.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use walkdir::WalkDir;

use crate::error::CompileError;

/// Extension given to synthesized string source names.
pub const STRING_SOURCE_EXTENSION: &str = "ts";

static STRING_SOURCE_COUNTER: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    File,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    File { name: String },
    String { name: String, contents: String },
}

impl SourceDescriptor {
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        SourceDescriptor::File {
            name: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    /// A string source with a synthesized `input_string<N>.ts` name.
    pub fn from_string(contents: impl Into<String>) -> Self {
        SourceDescriptor::String {
            name: next_string_name(),
            contents: contents.into(),
        }
    }

    pub fn from_named_string(name: impl Into<String>, contents: impl Into<String>) -> Self {
        SourceDescriptor::String {
            name: name.into(),
            contents: contents.into(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceDescriptor::File { .. } => SourceKind::File,
            SourceDescriptor::String { .. } => SourceKind::String,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SourceDescriptor::File { name } | SourceDescriptor::String { name, .. } => name,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        match self {
            SourceDescriptor::File { .. } => None,
            SourceDescriptor::String { contents, .. } => Some(contents),
        }
    }
}

/// Next synthesized string source name.
///
/// The counter is process-wide and shared by every host, so two unnamed
/// compilations running concurrently may interleave numbers. Callers that
/// need stable names across threads should name their sources.
pub fn next_string_name() -> String {
    let index = STRING_SOURCE_COUNTER.fetch_add(1, Ordering::SeqCst) + 1;
    format!("input_string{index}.{STRING_SOURCE_EXTENSION}")
}

/// Restart synthesized names at `input_string1.ts`.
pub fn reset_counter() {
    STRING_SOURCE_COUNTER.store(0, Ordering::SeqCst);
}

/// File descriptors for every `.ts`/`.tsx` file below `root`, sorted by path.
pub fn discover(root: impl AsRef<Path>) -> Result<Vec<SourceDescriptor>, CompileError> {
    let root = root.as_ref();
    let mut sources = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| CompileError::Discover {
            root: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_source = path
            .extension()
            .is_some_and(|ext| ext == "ts" || ext == "tsx");
        if entry.file_type().is_file() && is_source {
            sources.push(SourceDescriptor::from_file(path));
        }
    }
    Ok(sources)
}
