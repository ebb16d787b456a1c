//! A compiler host whose reads and writes can each target the file system
//! or in-memory maps.
//!
//! Read and write strategies are chosen independently:
//!
//! | strategy       | files                         | strings                          |
//! |----------------|-------------------------------|----------------------------------|
//! | read           | normalized path on disk       | registered sources, optional disk fallback |
//! | write          | creates directories, writes   | output map only                  |
//!
//! Every write lands in the output map, whatever the strategy, so a host can
//! be reused across runs to accumulate outputs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::CompilerConfig;
use crate::engine::CompilerHost;
use crate::error::HostError;
use crate::path;
use crate::source::{self, SourceKind};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Receives `(name, contents, write_byte_order_mark)` for every write.
pub type OutputRedirect<'w> = Box<dyn FnMut(&str, &str, bool) + 'w>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadStrategy {
    Files,
    Strings { fallback_to_files: bool },
}

pub struct VirtualHost<'w> {
    config: CompilerConfig,
    read: ReadStrategy,
    write: SourceKind,
    sources: HashMap<String, String>,
    source_order: Vec<String>,
    outputs: BTreeMap<String, String>,
    redirect: Option<OutputRedirect<'w>>,
    current_directory: Option<String>,
    existing_directories: HashSet<PathBuf>,
}

impl Default for VirtualHost<'_> {
    fn default() -> Self {
        VirtualHost::new(CompilerConfig::default())
    }
}

impl fmt::Debug for VirtualHost<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualHost")
            .field("read", &self.read)
            .field("write", &self.write)
            .field("sources", &self.source_order)
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .field("redirected", &self.redirect.is_some())
            .finish_non_exhaustive()
    }
}

impl<'w> VirtualHost<'w> {
    /// A host that reads from and writes to files.
    pub fn new(config: CompilerConfig) -> Self {
        VirtualHost {
            config,
            read: ReadStrategy::Files,
            write: SourceKind::File,
            sources: HashMap::new(),
            source_order: Vec::new(),
            outputs: BTreeMap::new(),
            redirect: None,
            current_directory: None,
            existing_directories: HashSet::new(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn read_from_files(&mut self) -> &mut Self {
        log::debug!("host reads from files");
        self.read = ReadStrategy::Files;
        self
    }

    /// Serve sources from the registered strings. With `fallback_to_files`,
    /// names that were never registered are looked up on disk.
    pub fn read_from_strings(&mut self, fallback_to_files: bool) -> &mut Self {
        log::debug!("host reads from strings (fallback to files: {fallback_to_files})");
        self.read = ReadStrategy::Strings { fallback_to_files };
        self
    }

    pub fn write_to_files(&mut self) -> &mut Self {
        log::debug!("host writes to files");
        self.write = SourceKind::File;
        self
    }

    pub fn write_to_strings(&mut self) -> &mut Self {
        log::debug!("host writes to strings");
        self.write = SourceKind::String;
        self
    }

    /// Forward every write to `writer`.
    ///
    /// When writing to strings the output is still recorded and the writer
    /// sees it as well. When writing to files the writer replaces the disk
    /// write.
    pub fn redirect_output(&mut self, writer: impl FnMut(&str, &str, bool) + 'w) -> &mut Self {
        self.redirect = Some(Box::new(writer));
        self
    }

    pub fn clear_redirect(&mut self) -> &mut Self {
        self.redirect = None;
        self
    }

    pub fn reads_from(&self) -> SourceKind {
        match self.read {
            ReadStrategy::Files => SourceKind::File,
            ReadStrategy::Strings { .. } => SourceKind::String,
        }
    }

    pub fn writes_to(&self) -> SourceKind {
        self.write
    }

    pub fn fallback_to_files(&self) -> bool {
        matches!(self.read, ReadStrategy::Strings { fallback_to_files: true })
    }

    /// Register or replace a string source.
    ///
    /// Sources registered while reading from files are kept but not served
    /// until the host switches to reading from strings.
    pub fn add_source(&mut self, name: impl Into<String>, contents: impl Into<String>) -> &mut Self {
        let name = name.into();
        if self.read == ReadStrategy::Files {
            log::debug!("source {name} registered while reading from files");
        }
        if self.sources.insert(name.clone(), contents.into()).is_none() {
            self.source_order.push(name);
        }
        self
    }

    /// Register a string source under a synthesized name.
    pub fn add_text(&mut self, contents: impl Into<String>) -> &mut Self {
        self.add_source(source::next_string_name(), contents)
    }

    /// Registered source names, in registration order.
    pub fn source_names(&self) -> Vec<String> {
        self.source_order.clone()
    }

    pub fn sources(&self) -> BTreeMap<String, String> {
        self.sources
            .iter()
            .map(|(name, contents)| (name.clone(), contents.clone()))
            .collect()
    }

    pub fn outputs(&self) -> BTreeMap<String, String> {
        self.outputs.clone()
    }

    /// Forget which directories were seen, so the next run checks again.
    pub(crate) fn reset_directory_cache(&mut self) {
        self.existing_directories.clear();
    }

    fn is_default_library(&self, name: &str) -> bool {
        path::normalize(name) == path::normalize(&self.default_library())
    }

    fn read_disk(&self, name: &str) -> Result<Option<String>, HostError> {
        let normalized = path::normalize(name);
        match fs::read_to_string(&normalized) {
            Ok(text) => {
                log::debug!("read {normalized} from disk");
                Ok(Some(strip_byte_order_mark(text)))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(HostError::Read {
                name: name.to_string(),
                source,
            }),
        }
    }

    fn write_disk(&mut self, name: &str, data: &str, write_byte_order_mark: bool) -> Result<(), HostError> {
        let normalized = PathBuf::from(path::normalize(name));
        if let Some(parent) = normalized.parent() {
            self.ensure_directories_exist(parent)?;
        }
        let mut bytes = Vec::with_capacity(data.len() + 3);
        if write_byte_order_mark {
            bytes.extend_from_slice(BYTE_ORDER_MARK.to_string().as_bytes());
        }
        bytes.extend_from_slice(data.as_bytes());
        fs::write(&normalized, bytes).map_err(|source| HostError::Write {
            name: name.to_string(),
            source,
        })?;
        log::debug!("wrote {}", normalized.display());
        Ok(())
    }

    fn ensure_directories_exist(&mut self, directory: &Path) -> Result<(), HostError> {
        if directory.as_os_str().is_empty() || directory.parent().is_none() {
            return Ok(());
        }
        if self.existing_directories.contains(directory) {
            return Ok(());
        }
        if directory.is_dir() {
            self.existing_directories.insert(directory.to_path_buf());
            return Ok(());
        }
        if let Some(parent) = directory.parent() {
            self.ensure_directories_exist(parent)?;
        }
        match fs::create_dir(directory) {
            Ok(()) => log::debug!("created directory {}", directory.display()),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists && directory.is_dir() => {}
            Err(source) => {
                return Err(HostError::CreateDirectory {
                    path: directory.to_path_buf(),
                    source,
                });
            }
        }
        self.existing_directories.insert(directory.to_path_buf());
        Ok(())
    }
}

impl CompilerHost for VirtualHost<'_> {
    fn read_source(&mut self, name: &str) -> Result<Option<String>, HostError> {
        match self.read {
            ReadStrategy::Files => self.read_disk(name),
            ReadStrategy::Strings { fallback_to_files } => {
                if self.is_default_library(name) {
                    return self.read_disk(name);
                }
                if let Some(contents) = self.sources.get(name) {
                    return Ok(Some(contents.clone()));
                }
                if fallback_to_files {
                    return self.read_disk(name);
                }
                Ok(None)
            }
        }
    }

    fn write_file(
        &mut self,
        name: &str,
        data: &str,
        write_byte_order_mark: bool,
    ) -> Result<(), HostError> {
        match self.write {
            SourceKind::String => {
                self.outputs.insert(name.to_string(), data.to_string());
                if let Some(writer) = self.redirect.as_mut() {
                    writer(name, data, write_byte_order_mark);
                }
            }
            SourceKind::File => {
                match self.redirect.as_mut() {
                    Some(writer) => writer(name, data, write_byte_order_mark),
                    None => self.write_disk(name, data, write_byte_order_mark)?,
                }
                let recorded = if write_byte_order_mark {
                    format!("{BYTE_ORDER_MARK}{data}")
                } else {
                    data.to_string()
                };
                self.outputs.insert(name.to_string(), recorded);
            }
        }
        Ok(())
    }

    /// Empty while reading from strings; string sources have no location.
    fn current_directory(&mut self) -> Result<String, HostError> {
        if self.reads_from() == SourceKind::String {
            return Ok(String::new());
        }
        if let Some(directory) = &self.current_directory {
            return Ok(directory.clone());
        }
        let directory = std::env::current_dir()
            .map_err(HostError::CurrentDirectory)?
            .to_string_lossy()
            .into_owned();
        self.current_directory = Some(directory.clone());
        Ok(directory)
    }

    fn default_library(&self) -> String {
        self.config.default_library().to_string_lossy().into_owned()
    }

    fn canonical_file_name(&self, name: &str) -> String {
        if self.use_case_sensitive_file_names() {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        file_system_is_case_sensitive()
    }

    fn new_line(&self) -> &str {
        if cfg!(windows) { "\r\n" } else { "\n" }
    }
}

fn strip_byte_order_mark(text: String) -> String {
    match text.strip_prefix(BYTE_ORDER_MARK) {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Probed once per process by looking for the running executable under a
/// case-swapped name.
pub fn file_system_is_case_sensitive() -> bool {
    static CASE_SENSITIVE: OnceLock<bool> = OnceLock::new();
    *CASE_SENSITIVE.get_or_init(probe_case_sensitivity)
}

fn probe_case_sensitivity() -> bool {
    let platform_default = !cfg!(any(windows, target_os = "macos"));
    let Ok(executable) = std::env::current_exe() else {
        return platform_default;
    };
    let Some(file_name) = executable.file_name().and_then(|name| name.to_str()) else {
        return platform_default;
    };
    let swapped: String = file_name
        .chars()
        .map(|ch| {
            if ch.is_uppercase() {
                ch.to_lowercase().next().unwrap_or(ch)
            } else {
                ch.to_uppercase().next().unwrap_or(ch)
            }
        })
        .collect();
    if swapped == file_name {
        return platform_default;
    }
    !executable.with_file_name(swapped).exists()
}
