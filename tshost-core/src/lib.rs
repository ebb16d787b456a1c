//! Hosting layer for a TypeScript compiler engine.
//!
//! This crate drives an engine through a virtual host that can read sources
//! from disk or from in-memory strings and write outputs to disk or to
//! memory. The flow of one compilation is roughly:
//!
//!   caller input (paths, strings, descriptors) + arguments
//!     -> compiler   (normalize input, parse arguments)
//!     -> host       (serve sources, capture outputs)
//!     -> engine     (program, early + semantic diagnostics, emission)
//!     -> result     (outputs, source maps, rendered diagnostics)
//!
//! Tools (the `tshost` CLI, build scripts, tests) should depend on this
//! crate rather than talking to an engine directly.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Inputs: paths, sources, arguments, configuration
// ---------------------------------------------------------------------

pub mod args;
pub mod config;
pub mod path;
pub mod source;

// ---------------------------------------------------------------------
// Engine contract and the host that serves it
// ---------------------------------------------------------------------

pub mod engine;
pub mod host;

// ---------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------

pub mod compiler;
pub mod result;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use args::{Arguments, CompilerOptions, ParsedCommandLine};
pub use compiler::{Compiler, FileList, StringInput, StringSources};
pub use config::CompilerConfig;
pub use diagnostic::{Diagnostic, DiagnosticCategory, SourceFile};
pub use engine::{CompilerHost, Engine, PassthroughEngine};
pub use error::{CompileError, HostError};
pub use host::VirtualHost;
pub use result::{CompilationResult, DiagnosticCallback, Disposition};
pub use source::{SourceDescriptor, SourceKind, discover, reset_counter};
