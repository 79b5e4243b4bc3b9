//! The fixture test orchestrator.
//!
//! A [`FixtureSession`] owns a compiler and a [`PathConfig`]. Running a
//! fixture compiles its `input.scss` (through an import, so resolution goes
//! through the include paths exactly like production usage) while reading its
//! `output.css`, then compares the two.

use std::path::{Path, PathBuf};

use crate::compiler::{CompileOptions, CompileResult, DiagnosticSink, StyleCompiler};
use crate::config::{PathConfig, PathUpdate};
use crate::error::FixtureError;
use crate::fixture::{self, FixturePaths};
use crate::report::{FixtureStatus, Mismatch, SuiteReport};

/// A fixture that compiled and matched its expected output.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureOutcome {
    pub result: CompileResult,
    pub expected: String,
}

/// Outcome of comparing a compiled fixture with its expected output.
enum Evaluation {
    Match(FixtureOutcome),
    Mismatch(Mismatch),
}

pub struct FixtureSession<C> {
    compiler: C,
    paths: PathConfig,
}

impl<C: StyleCompiler> FixtureSession<C> {
    /// A session with the default host-project paths.
    pub fn new(compiler: C) -> Self {
        Self::with_paths(compiler, PathConfig::default())
    }

    pub fn with_paths(compiler: C, paths: PathConfig) -> Self {
        Self { compiler, paths }
    }

    pub fn paths(&self) -> &PathConfig {
        &self.paths
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    // =====================
    // Configuration
    // =====================

    /// Merges `update` into the session's paths; absent or empty fields are
    /// left untouched.
    pub fn configure_paths(&mut self, update: PathUpdate) {
        self.paths.apply(update);
        tracing::debug!(paths = ?self.paths, "fixture paths configured");
    }

    /// Applies a partial update stored in a JSON or YAML file.
    pub fn configure_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), FixtureError> {
        let update = PathUpdate::load(path)?;
        self.configure_paths(update);
        Ok(())
    }

    // =====================
    // Resolution
    // =====================

    /// The fixtures root joined with `segments`.
    pub fn fixture<I, S>(&self, segments: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        fixture::fixture(&self.paths, segments)
    }

    /// Fixture names under `fixtures_root/<subtree>`, sorted.
    pub fn discover(&self, subtree: impl AsRef<Path>) -> Result<Vec<String>, FixtureError> {
        fixture::discover_fixtures(&self.paths, self.fixture([subtree]))
    }

    /// Options for compiling `paths`: the caller's include paths first, then
    /// the fixtures root, then the configured include paths.
    fn compile_options(&self, paths: &FixturePaths, options: CompileOptions) -> CompileOptions {
        let mut include_paths = options.include_paths;
        include_paths.push(self.paths.fixtures_root.clone());
        include_paths.extend(self.paths.include_paths.iter().cloned());

        CompileOptions {
            file: Some(paths.source.clone()),
            out_file: Some(paths.output.clone()),
            data: Some(paths.entry_source()),
            include_paths,
            source_map: true,
            omit_source_map_url: true,
            extra: options.extra,
        }
    }

    // =====================
    // Execution
    // =====================

    async fn evaluate(&self, name: &str, options: CompileOptions) -> Result<Evaluation, FixtureError> {
        let paths = FixturePaths::resolve(&self.paths, name);
        let options = self.compile_options(&paths, options);
        let mut sink = DiagnosticSink::new();

        tracing::debug!(
            fixture = name,
            source = %paths.source.display(),
            output = %paths.output.display(),
            "running fixture"
        );

        let (expected, compiled) = tokio::join!(
            tokio::fs::read_to_string(&paths.output),
            self.compiler.compile(&options, &mut sink),
        );

        // Settled in a fixed order: a compiler error wins over a missing or
        // unreadable output file.
        let (output, expected) = match (compiled, expected) {
            (Err(err), _) => {
                tracing::debug!(fixture = name, error = %err, "compiler failed");
                return Err(FixtureError::Compile(err));
            }
            (Ok(_), Err(source)) => {
                tracing::debug!(fixture = name, error = %source, "expected output unreadable");
                return Err(FixtureError::Io {
                    path: paths.output,
                    source,
                });
            }
            (Ok(output), Ok(expected)) => (output, expected),
        };

        let result = CompileResult::from_output(output, sink)?;
        if result.css == expected {
            return Ok(Evaluation::Match(FixtureOutcome { result, expected }));
        }
        Ok(Evaluation::Mismatch(Mismatch {
            fixture: name.to_string(),
            expected,
            actual: result.css,
        }))
    }

    /// Compiles fixture `name` and compares it with its `output.css`.
    ///
    /// Compiler and I/O failures are returned. A successful compile whose
    /// output differs from `output.css` panics with a diff: that is a test
    /// failure, not an error for the caller to inspect.
    ///
    /// # Panics
    ///
    /// On an output mismatch, and when polled outside a Tokio runtime: the
    /// expected output is read through `tokio::fs`.
    pub async fn run_fixture(
        &self,
        name: &str,
        options: CompileOptions,
    ) -> Result<FixtureOutcome, FixtureError> {
        match self.evaluate(name, options).await? {
            Evaluation::Match(outcome) => Ok(outcome),
            Evaluation::Mismatch(mismatch) => panic!("{}", mismatch.render()),
        }
    }

    /// Runs fixture `name` and hands the outcome to `callback`, exactly once.
    ///
    /// # Panics
    ///
    /// Under the same conditions as [`run_fixture`](Self::run_fixture).
    pub async fn test_fixture<F, T>(&self, name: &str, options: CompileOptions, callback: F) -> T
    where
        F: FnOnce(Result<FixtureOutcome, FixtureError>) -> T,
    {
        callback(self.run_fixture(name, options).await)
    }

    /// [`run_fixture`](Self::run_fixture) driven on a current-thread runtime,
    /// for plain `#[test]` functions.
    ///
    /// Called from inside a running Tokio runtime it returns
    /// [`FixtureError::Runtime`] instead of nesting a second one.
    ///
    /// # Panics
    ///
    /// On an output mismatch.
    pub fn test_fixture_blocking(
        &self,
        name: &str,
        options: CompileOptions,
    ) -> Result<FixtureOutcome, FixtureError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(FixtureError::Runtime {
                reason: "already inside an async runtime".to_string(),
            });
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FixtureError::Runtime {
                reason: e.to_string(),
            })?;
        runtime.block_on(self.run_fixture(name, options))
    }

    /// Runs every fixture under `fixtures_root/<subtree>` without panicking.
    ///
    /// Fixtures run one after another; each gets a clone of `options`.
    ///
    /// # Panics
    ///
    /// When polled outside a Tokio runtime.
    pub async fn run_suite(
        &self,
        subtree: impl AsRef<Path>,
        options: CompileOptions,
    ) -> Result<SuiteReport, FixtureError> {
        let mut report = SuiteReport::default();
        for name in self.discover(subtree)? {
            let status = match self.evaluate(&name, options.clone()).await {
                Ok(Evaluation::Match(_)) => FixtureStatus::Passed,
                Ok(Evaluation::Mismatch(mismatch)) => FixtureStatus::Mismatch(mismatch),
                Err(err) => FixtureStatus::Failed(err),
            };
            report.push(name, status);
        }
        tracing::debug!(passed = report.passed(), failed = report.failed(), "fixture suite finished");
        Ok(report)
    }
}
