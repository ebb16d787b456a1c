use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("failed to discover sources under {}: {source}", root.display())]
    Discover {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Failures raised by a host while serving the engine.
///
/// Read and write failures are handed back to the engine, which turns them
/// into diagnostics; only `CurrentDirectory` escapes to the caller.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read source {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to resolve the current directory: {0}")]
    CurrentDirectory(#[source] io::Error),
}

impl HostError {
    /// The underlying I/O failure, without the file name.
    pub fn reason(&self) -> String {
        match self {
            HostError::Read { source, .. }
            | HostError::Write { source, .. }
            | HostError::CreateDirectory { source, .. }
            | HostError::CurrentDirectory(source) => source.to_string(),
        }
    }
}
