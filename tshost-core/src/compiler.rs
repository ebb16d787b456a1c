//! Entry points that turn caller input into one compilation run.
//!
//! Every entry point normalizes its input into a [`CompileRequest`] (a list
//! of source descriptors, the arguments, the configuration and an optional
//! diagnostic callback) and hands it to a single routine that drives the
//! engine:
//!
//! 1. parse arguments and add the default library unless `--noLib`;
//! 2. register string sources with the host and collect root file names;
//! 3. early diagnostics, stopping here in full mode if there are any;
//! 4. semantic diagnostics (full mode only);
//! 5. emission, then a snapshot of the host's outputs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::args::Arguments;
use crate::config::CompilerConfig;
use crate::engine::{CompilerHost, Engine, PassthroughEngine};
use crate::error::CompileError;
use crate::host::VirtualHost;
use crate::result::{CompilationResult, DiagnosticCallback, DiagnosticReporter};
use crate::source::{SourceDescriptor, SourceKind};

/// Name given to the raw text passed to [`Compiler::compile_string`].
pub const STRING_INPUT_NAME: &str = "string.ts";

/// One path or a list of paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileList(pub Vec<String>);

impl From<&str> for FileList {
    fn from(path: &str) -> Self {
        FileList(vec![path.to_string()])
    }
}

impl From<String> for FileList {
    fn from(path: String) -> Self {
        FileList(vec![path])
    }
}

impl From<&Path> for FileList {
    fn from(path: &Path) -> Self {
        FileList(vec![path.to_string_lossy().into_owned()])
    }
}

impl From<PathBuf> for FileList {
    fn from(path: PathBuf) -> Self {
        FileList::from(path.as_path())
    }
}

impl From<Vec<String>> for FileList {
    fn from(paths: Vec<String>) -> Self {
        FileList(paths)
    }
}

impl From<Vec<&str>> for FileList {
    fn from(paths: Vec<&str>) -> Self {
        FileList::from(paths.as_slice())
    }
}

impl From<&[&str]> for FileList {
    fn from(paths: &[&str]) -> Self {
        FileList(paths.iter().map(|path| path.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FileList {
    fn from(paths: [&str; N]) -> Self {
        FileList::from(paths.as_slice())
    }
}

impl From<Vec<PathBuf>> for FileList {
    fn from(paths: Vec<PathBuf>) -> Self {
        FileList(
            paths
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect(),
        )
    }
}

/// Raw source text or a string-backed descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringInput {
    Text(String),
    Descriptor(SourceDescriptor),
}

impl From<&str> for StringInput {
    fn from(text: &str) -> Self {
        StringInput::Text(text.to_string())
    }
}

impl From<String> for StringInput {
    fn from(text: String) -> Self {
        StringInput::Text(text)
    }
}

impl From<SourceDescriptor> for StringInput {
    fn from(descriptor: SourceDescriptor) -> Self {
        StringInput::Descriptor(descriptor)
    }
}

/// Several in-memory sources: named pairs, descriptors, or unnamed texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringSources {
    Named(Vec<(String, String)>),
    Descriptors(Vec<SourceDescriptor>),
    Texts(Vec<String>),
}

impl From<BTreeMap<String, String>> for StringSources {
    fn from(sources: BTreeMap<String, String>) -> Self {
        StringSources::Named(sources.into_iter().collect())
    }
}

impl From<HashMap<String, String>> for StringSources {
    fn from(sources: HashMap<String, String>) -> Self {
        let mut named: Vec<(String, String)> = sources.into_iter().collect();
        named.sort();
        StringSources::Named(named)
    }
}

impl From<HashMap<&str, &str>> for StringSources {
    fn from(sources: HashMap<&str, &str>) -> Self {
        let mut named: Vec<(String, String)> = sources
            .into_iter()
            .map(|(name, contents)| (name.to_string(), contents.to_string()))
            .collect();
        named.sort();
        StringSources::Named(named)
    }
}

impl From<Vec<(String, String)>> for StringSources {
    fn from(named: Vec<(String, String)>) -> Self {
        StringSources::Named(named)
    }
}

impl From<Vec<(&str, &str)>> for StringSources {
    fn from(named: Vec<(&str, &str)>) -> Self {
        StringSources::from(named.as_slice())
    }
}

impl From<&[(&str, &str)]> for StringSources {
    fn from(named: &[(&str, &str)]) -> Self {
        StringSources::Named(
            named
                .iter()
                .map(|(name, contents)| (name.to_string(), contents.to_string()))
                .collect(),
        )
    }
}

impl<const N: usize> From<[(&str, &str); N]> for StringSources {
    fn from(named: [(&str, &str); N]) -> Self {
        StringSources::from(named.as_slice())
    }
}

impl From<Vec<SourceDescriptor>> for StringSources {
    fn from(descriptors: Vec<SourceDescriptor>) -> Self {
        StringSources::Descriptors(descriptors)
    }
}

impl From<Vec<String>> for StringSources {
    fn from(texts: Vec<String>) -> Self {
        StringSources::Texts(texts)
    }
}

impl From<Vec<&str>> for StringSources {
    fn from(texts: Vec<&str>) -> Self {
        StringSources::Texts(texts.into_iter().map(str::to_string).collect())
    }
}

impl FileList {
    fn into_descriptors(self) -> Result<Vec<SourceDescriptor>, CompileError> {
        if self.0.is_empty() {
            return Err(CompileError::InvalidInput("no input files".to_string()));
        }
        Ok(self.0.into_iter().map(SourceDescriptor::from_file).collect())
    }
}

impl StringInput {
    /// `None` for empty raw text, which never reaches the engine.
    fn into_descriptor(self) -> Result<Option<SourceDescriptor>, CompileError> {
        match self {
            StringInput::Text(text) if text.is_empty() => Ok(None),
            StringInput::Text(text) => Ok(Some(SourceDescriptor::from_named_string(
                STRING_INPUT_NAME,
                text,
            ))),
            StringInput::Descriptor(descriptor) => {
                require_string_kind(&descriptor)?;
                Ok(Some(descriptor))
            }
        }
    }
}

impl StringSources {
    fn into_descriptors(self) -> Result<Vec<SourceDescriptor>, CompileError> {
        match self {
            StringSources::Named(named) => Ok(named
                .into_iter()
                .map(|(name, contents)| SourceDescriptor::from_named_string(name, contents))
                .collect()),
            StringSources::Descriptors(descriptors) => {
                for descriptor in &descriptors {
                    require_string_kind(descriptor)?;
                }
                Ok(descriptors)
            }
            StringSources::Texts(texts) => {
                Ok(texts.into_iter().map(SourceDescriptor::from_string).collect())
            }
        }
    }
}

fn require_string_kind(descriptor: &SourceDescriptor) -> Result<(), CompileError> {
    if descriptor.kind() == SourceKind::String {
        Ok(())
    } else {
        Err(CompileError::InvalidInput(format!(
            "expected a string source, got file {}",
            descriptor.name()
        )))
    }
}

/// Everything one run needs, whatever entry point it came from.
struct CompileRequest<'r, 'cb> {
    sources: Vec<SourceDescriptor>,
    arguments: Arguments,
    config: &'r CompilerConfig,
    on_diagnostic: Option<&'r mut DiagnosticCallback<'cb>>,
}

impl<'r, 'cb> CompileRequest<'r, 'cb> {
    fn new(
        sources: Vec<SourceDescriptor>,
        arguments: Arguments,
        config: &'r CompilerConfig,
        on_diagnostic: Option<&'r mut DiagnosticCallback<'cb>>,
    ) -> Result<Self, CompileError> {
        let mut names = HashSet::new();
        for source in &sources {
            if !names.insert(source.name()) {
                return Err(CompileError::InvalidInput(format!(
                    "duplicate source name {}",
                    source.name()
                )));
            }
        }
        Ok(CompileRequest {
            sources,
            arguments,
            config,
            on_diagnostic,
        })
    }
}

/// Drives an [`Engine`] through a [`VirtualHost`].
#[derive(Debug, Clone)]
pub struct Compiler<E = PassthroughEngine> {
    engine: E,
}

impl Default for Compiler<PassthroughEngine> {
    fn default() -> Self {
        Compiler::new(PassthroughEngine)
    }
}

impl<E: Engine> Compiler<E> {
    pub fn new(engine: E) -> Self {
        Compiler { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Compile files on disk, writing outputs to disk.
    pub fn compile(
        &self,
        files: impl Into<FileList>,
        args: impl Into<Arguments>,
        config: &CompilerConfig,
        on_diagnostic: Option<&mut DiagnosticCallback<'_>>,
    ) -> Result<CompilationResult, CompileError> {
        let sources = files.into().into_descriptors()?;
        let request = CompileRequest::new(sources, args.into(), config, on_diagnostic)?;
        let mut host = VirtualHost::new(config.clone());
        self.run(&mut host, request)
    }

    /// Compile one in-memory source and return the emitted text, every
    /// output concatenated in write order.
    pub fn compile_string(
        &self,
        input: impl Into<StringInput>,
        args: impl Into<Arguments>,
        config: &CompilerConfig,
        on_diagnostic: Option<&mut DiagnosticCallback<'_>>,
    ) -> Result<String, CompileError> {
        let Some(source) = input.into().into_descriptor()? else {
            return Ok(String::new());
        };
        let request = CompileRequest::new(vec![source], args.into(), config, on_diagnostic)?;
        let mut emitted = String::new();
        {
            let mut host = VirtualHost::new(config.clone());
            host.read_from_strings(false)
                .write_to_strings()
                .redirect_output(|_, data, _| emitted.push_str(data));
            self.run(&mut host, request)?;
        }
        Ok(emitted)
    }

    /// Compile several in-memory sources that may reference each other by
    /// name. Outputs stay in memory.
    pub fn compile_strings(
        &self,
        input: impl Into<StringSources>,
        args: impl Into<Arguments>,
        config: &CompilerConfig,
        on_diagnostic: Option<&mut DiagnosticCallback<'_>>,
    ) -> Result<CompilationResult, CompileError> {
        let sources = input.into().into_descriptors()?;
        let request = CompileRequest::new(sources, args.into(), config, on_diagnostic)?;
        let mut host = VirtualHost::new(config.clone());
        host.read_from_strings(false).write_to_strings();
        self.run(&mut host, request)
    }

    /// Compile with a caller-configured host. Outputs accumulate in the host
    /// across calls.
    pub fn compile_with_host(
        &self,
        host: &mut VirtualHost<'_>,
        sources: Vec<SourceDescriptor>,
        args: impl Into<Arguments>,
        config: &CompilerConfig,
        on_diagnostic: Option<&mut DiagnosticCallback<'_>>,
    ) -> Result<CompilationResult, CompileError> {
        let request = CompileRequest::new(sources, args.into(), config, on_diagnostic)?;
        self.run(host, request)
    }

    fn run(
        &self,
        host: &mut VirtualHost<'_>,
        request: CompileRequest<'_, '_>,
    ) -> Result<CompilationResult, CompileError> {
        let CompileRequest {
            sources,
            arguments,
            config,
            on_diagnostic,
        } = request;

        if host.reads_from() == SourceKind::File {
            if let Some(source) = sources.iter().find(|source| source.kind() == SourceKind::String) {
                return Err(CompileError::InvalidInput(format!(
                    "string source {} given to a host that reads from files",
                    source.name()
                )));
            }
        }

        let mut command_line = match arguments {
            Arguments::Raw(tokens) => self.engine.parse_arguments(&tokens),
            Arguments::Parsed(parsed) => parsed,
        };
        if !command_line.options.no_lib {
            command_line.options.default_library = Some(host.default_library());
        }

        host.reset_directory_cache();
        let directory = host.current_directory()?;

        let mut files = Vec::new();
        match host.reads_from() {
            SourceKind::String => {
                let mut on_disk = Vec::new();
                for source in sources {
                    match source {
                        SourceDescriptor::String { name, contents } => {
                            host.add_source(name, contents);
                        }
                        SourceDescriptor::File { name } => on_disk.push(name),
                    }
                }
                files.extend(host.source_names());
                files.extend(on_disk);
            }
            SourceKind::File => {
                files.extend(sources.iter().map(|source| source.name().to_string()));
            }
        }
        for name in std::mem::take(&mut command_line.file_names) {
            if !files.contains(&name) {
                files.push(name);
            }
        }
        log::info!(
            "compiling {} file(s) in {:?}",
            files.len(),
            if directory.is_empty() { "<memory>" } else { directory.as_str() }
        );

        let program = self
            .engine
            .create_program(&files, &command_line.options, host);
        let mut reporter = DiagnosticReporter::new(on_diagnostic);

        let mut early = std::mem::take(&mut command_line.errors);
        early.extend(program.diagnostics());
        let stop_after_early = config.full_type_check && !early.is_empty();
        reporter.forward(early);

        let mut source_maps = Vec::new();
        if stop_after_early {
            log::info!("early diagnostics reported, skipping emission");
        } else {
            let mut checker = program.type_checker(config.full_type_check);
            if config.full_type_check {
                reporter.forward(checker.diagnostics());
            }
            let emitted = checker.emit_files(host);
            reporter.forward(emitted.diagnostics);
            source_maps = emitted.source_maps;
        }

        let result = CompilationResult {
            outputs: host.outputs(),
            source_maps,
            diagnostics: reporter.finish(),
        };
        log::info!(
            "compilation finished with {} output(s) and {} diagnostic(s)",
            result.outputs.len(),
            result.diagnostics.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_list_accepts_single_and_many_paths() {
        assert_eq!(FileList::from("a.ts").0, vec!["a.ts"]);
        assert_eq!(FileList::from(["a.ts", "b.ts"]).0, vec!["a.ts", "b.ts"]);
        assert_eq!(
            FileList::from(vec![PathBuf::from("dir/a.ts")]).0,
            vec![PathBuf::from("dir/a.ts").to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn empty_file_list_is_rejected() {
        let err = FileList(Vec::new()).into_descriptors().unwrap_err();
        assert!(matches!(err, CompileError::InvalidInput(_)));
    }

    #[test]
    fn string_sources_normalize_to_unique_descriptors() {
        let mut map = HashMap::new();
        map.insert("b.ts", "var b;");
        map.insert("a.ts", "var a;");
        let named = StringSources::from(map).into_descriptors().unwrap();
        let names: Vec<&str> = named.iter().map(SourceDescriptor::name).collect();
        assert_eq!(names, vec!["a.ts", "b.ts"]);

        let texts = StringSources::from(vec!["var a;", "var b;", "var a;"])
            .into_descriptors()
            .unwrap();
        let unique: HashSet<&str> = texts.iter().map(SourceDescriptor::name).collect();
        assert_eq!(texts.len(), 3);
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn file_descriptors_are_not_string_input() {
        let err = StringInput::from(SourceDescriptor::from_file("a.ts"))
            .into_descriptor()
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidInput(_)));

        let err = StringSources::from(vec![SourceDescriptor::from_file("a.ts")])
            .into_descriptors()
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidInput(_)));
    }

    #[test]
    fn raw_text_is_named_string_ts() {
        let source = StringInput::from("var a;").into_descriptor().unwrap().unwrap();
        assert_eq!(source.name(), STRING_INPUT_NAME);
        assert_eq!(StringInput::from("").into_descriptor().unwrap(), None);
    }

    #[test]
    fn default_compiler_uses_the_passthrough_engine() {
        let compiler = Compiler::default();
        let output = compiler
            .compile_string("var a;", "", &CompilerConfig::default(), None)
            .unwrap();
        assert_eq!(output, "var a;\n");
    }

    #[test]
    fn string_sources_need_a_string_reading_host() {
        let config = CompilerConfig::default();
        let mut host = VirtualHost::new(config.clone());
        let err = Compiler::default()
            .compile_with_host(
                &mut host,
                vec![SourceDescriptor::from_named_string("a.ts", "var a;")],
                "",
                &config,
                None,
            )
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidInput(message) if message.contains("a.ts")));
        assert!(host.outputs().is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let config = CompilerConfig::default();
        let sources = vec![
            SourceDescriptor::from_named_string("a.ts", "1"),
            SourceDescriptor::from_named_string("a.ts", "2"),
        ];
        let err = CompileRequest::new(sources, Arguments::default(), &config, None)
            .err()
            .expect("duplicate rejected");
        assert!(matches!(err, CompileError::InvalidInput(message) if message.contains("a.ts")));
    }
}
