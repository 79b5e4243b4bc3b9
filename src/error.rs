//! Errors handed back to callers of the fixture orchestrator.
//!
//! A fixture invocation fails for one of three domain reasons: the compiler
//! rejected the source, the expected output could not be read, or the
//! compiler produced a source map that is not valid JSON. Loading a path
//! configuration and starting the blocking runtime can fail too. Output
//! mismatches are absent here; they are test failures and panic instead.

use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::compiler::CompileError;

#[derive(Error, Diagnostic, Debug)]
pub enum FixtureError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error("failed to read expected output '{}': {source}", path.display())]
    #[diagnostic(
        code(sass_fixture::io),
        help("every fixture directory needs an `output.css` next to its `input.scss`")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("compiler returned a source map that is not valid JSON: {0}")]
    #[diagnostic(code(sass_fixture::source_map))]
    SourceMap(#[source] serde_json::Error),

    #[error("failed to load path configuration from '{}': {reason}", path.display())]
    #[diagnostic(code(sass_fixture::config))]
    Config { path: PathBuf, reason: String },

    #[error("cannot run a fixture on a blocking runtime: {reason}")]
    #[diagnostic(
        code(sass_fixture::runtime),
        help("inside an async test, await `run_fixture` instead")
    )]
    Runtime { reason: String },
}

impl FixtureError {
    /// Native I/O error kind, for the `Io` variant only.
    pub fn kind(&self) -> Option<io::ErrorKind> {
        match self {
            FixtureError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    /// The compiler's error, if the compiler is what failed.
    pub fn as_compile(&self) -> Option<&CompileError> {
        match self {
            FixtureError::Compile(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(io::ErrorKind::NotFound)
    }
}
