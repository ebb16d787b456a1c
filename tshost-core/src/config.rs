use std::path::PathBuf;

/// Location of the ambient declarations shipped with this crate.
pub fn default_library_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("lib")
        .join("lib.d.ts")
}

/// Per-run configuration shared by the host and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Overrides [`default_library_path`] when set.
    pub default_library_path: Option<PathBuf>,
    /// When false, semantic diagnostics are skipped and only early
    /// structural errors are reported.
    pub full_type_check: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            default_library_path: None,
            full_type_check: true,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_library_path = Some(path.into());
        self
    }

    pub fn with_full_type_check(mut self, enabled: bool) -> Self {
        self.full_type_check = enabled;
        self
    }

    pub fn default_library(&self) -> PathBuf {
        self.default_library_path
            .clone()
            .unwrap_or_else(default_library_path)
    }
}
