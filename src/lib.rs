//! Fixture-driven tests for style-sheet transpiler modules.
//!
//! Each fixture is a directory under `test/fixtures` holding an `input.scss`
//! and the `output.css` it must compile to. A [`FixtureSession`] compiles the
//! input with any [`StyleCompiler`], captures `@warn`/`@debug` messages, reads
//! the expected output concurrently and compares the two.
//!
//! ```rust,no_run
//! # use sass_fixture::{CompileOptions, FixtureSession, StyleCompiler};
//! # fn check<C: StyleCompiler>(compiler: C) {
//! let session = FixtureSession::new(compiler);
//! let outcome = session
//!     .test_fixture_blocking("buttons/primary", CompileOptions::new())
//!     .expect("fixture should compile");
//! assert!(outcome.result.warn.is_empty());
//! # }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod fixture;
pub mod report;
pub mod session;

pub use crate::compiler::{
    CompileError, CompileOptions, CompileOutput, CompileResult, Css, DiagnosticSink, Directive,
    SourceMap, StyleCompiler,
};
pub use crate::config::{PathConfig, PathUpdate};
pub use crate::error::FixtureError;
pub use crate::fixture::{discover_fixtures, fixture, FixturePaths, INPUT_FILE, OUTPUT_FILE};
pub use crate::report::{FixtureStatus, Mismatch, SuiteReport};
pub use crate::session::{FixtureOutcome, FixtureSession};
