//! Command-line style compiler arguments.
//!
//! Callers may pass arguments as one space-joined string or as a list of
//! tokens; both end up as the same token list before parsing. Option names
//! are case-insensitive and may use one or two leading dashes. A token of the
//! form `@file` is replaced by the whitespace-separated tokens of that file.

use std::fs;

use crate::diagnostic::Diagnostic;

/// Spelling of the flag that suppresses the default library.
pub const NO_LIB_FLAG: &str = "--noLib";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    pub out: Option<String>,
    pub out_dir: Option<String>,
    pub module: Option<String>,
    pub target: Option<String>,
    pub source_map: bool,
    pub declaration: bool,
    pub remove_comments: bool,
    pub no_implicit_any: bool,
    pub no_lib: bool,
    pub no_resolve: bool,
    /// Default library file the engine loads ahead of the root files.
    pub default_library: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommandLine {
    pub options: CompilerOptions,
    pub file_names: Vec<String>,
    pub errors: Vec<Diagnostic>,
}

/// Arguments as handed to an entry point: raw tokens or an already parsed
/// command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arguments {
    Raw(Vec<String>),
    Parsed(ParsedCommandLine),
}

impl Default for Arguments {
    fn default() -> Self {
        Arguments::Raw(Vec::new())
    }
}

impl From<&str> for Arguments {
    fn from(args: &str) -> Self {
        Arguments::Raw(args.split_whitespace().map(str::to_string).collect())
    }
}

impl From<String> for Arguments {
    fn from(args: String) -> Self {
        Arguments::from(args.as_str())
    }
}

impl From<Option<&str>> for Arguments {
    fn from(args: Option<&str>) -> Self {
        args.map(Arguments::from).unwrap_or_default()
    }
}

impl From<Vec<String>> for Arguments {
    fn from(args: Vec<String>) -> Self {
        Arguments::Raw(args)
    }
}

impl From<Vec<&str>> for Arguments {
    fn from(args: Vec<&str>) -> Self {
        Arguments::from(args.as_slice())
    }
}

impl From<&[&str]> for Arguments {
    fn from(args: &[&str]) -> Self {
        Arguments::Raw(args.iter().map(|arg| arg.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Arguments {
    fn from(args: [&str; N]) -> Self {
        Arguments::from(args.as_slice())
    }
}

impl From<ParsedCommandLine> for Arguments {
    fn from(parsed: ParsedCommandLine) -> Self {
        Arguments::Parsed(parsed)
    }
}

pub fn parse_command_line(args: &[String]) -> ParsedCommandLine {
    let mut parsed = ParsedCommandLine::default();
    parse_tokens(args.iter().cloned(), &mut parsed, true);
    parsed
}

fn parse_tokens(
    tokens: impl IntoIterator<Item = String>,
    parsed: &mut ParsedCommandLine,
    expand_response_files: bool,
) {
    let mut tokens = tokens.into_iter().filter(|token| !token.is_empty());
    while let Some(token) = tokens.next() {
        if let Some(file) = token.strip_prefix('@').filter(|_| expand_response_files) {
            parse_response_file(file, parsed);
            continue;
        }
        let Some(name) = option_name(&token) else {
            parsed.file_names.push(token);
            continue;
        };
        let options = &mut parsed.options;
        match name.to_ascii_lowercase().as_str() {
            "out" => options.out = option_value(&mut tokens, &token, &mut parsed.errors),
            "outdir" => options.out_dir = option_value(&mut tokens, &token, &mut parsed.errors),
            "m" | "module" => {
                options.module = option_value(&mut tokens, &token, &mut parsed.errors)
            }
            "t" | "target" => {
                options.target = option_value(&mut tokens, &token, &mut parsed.errors)
            }
            "sourcemap" => options.source_map = true,
            "d" | "declaration" => options.declaration = true,
            "removecomments" => options.remove_comments = true,
            "noimplicitany" => options.no_implicit_any = true,
            "nolib" => options.no_lib = true,
            "noresolve" => options.no_resolve = true,
            _ => parsed.errors.push(Diagnostic::error(
                5023,
                format!("Unknown compiler option '{name}'."),
            )),
        }
    }
}

fn option_name(token: &str) -> Option<&str> {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .filter(|name| !name.is_empty())
}

fn option_value(
    tokens: &mut impl Iterator<Item = String>,
    flag: &str,
    errors: &mut Vec<Diagnostic>,
) -> Option<String> {
    let value = tokens.next();
    if value.is_none() {
        let name = option_name(flag).unwrap_or(flag);
        errors.push(Diagnostic::error(
            6044,
            format!("Compiler option '{name}' expects an argument."),
        ));
    }
    value
}

fn parse_response_file(file: &str, parsed: &mut ParsedCommandLine) {
    match fs::read_to_string(file) {
        Ok(text) => parse_tokens(tokenize_response_file(&text), parsed, false),
        Err(err) => {
            log::debug!("response file {file} could not be read: {err}");
            parsed
                .errors
                .push(Diagnostic::error(6050, format!("Unable to open file '{file}'.")));
        }
    }
}

fn tokenize_response_file(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    loop {
        while chars.next_if(|ch| ch.is_whitespace()).is_some() {}
        let Some(first) = chars.next() else {
            break;
        };
        let mut token = String::new();
        if first == '"' {
            for ch in chars.by_ref() {
                if ch == '"' {
                    break;
                }
                token.push(ch);
            }
        } else {
            token.push(first);
            while let Some(ch) = chars.next_if(|ch| !ch.is_whitespace()) {
                token.push(ch);
            }
        }
        tokens.push(token);
    }
    tokens
}
