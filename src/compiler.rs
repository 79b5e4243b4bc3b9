//! The seam between the fixture orchestrator and a style-sheet compiler.
//!
//! The compiler itself is an external collaborator. Anything that can turn a
//! [`CompileOptions`] into CSS implements [`StyleCompiler`]; the orchestrator
//! only relies on the contract below:
//!
//! - `data` holds the entry source (an `@import` of the fixture's `input`
//!   module), resolved through `include_paths` in order.
//! - `@warn` and `@debug` messages go to the [`DiagnosticSink`] instead of
//!   the compiler's default output.
//! - Failures come back as a [`CompileError`] carrying the position of the
//!   offending rule.

use futures::future::BoxFuture;
use miette::Diagnostic;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

use crate::error::FixtureError;

// ============================================================================
// OPTIONS
// ============================================================================

/// Options forwarded to the compiler.
///
/// `extra` is opaque to this crate and passed through untouched, so compiler
/// specific settings (output style, precision, ...) can ride along.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileOptions {
    pub file: Option<PathBuf>,
    pub out_file: Option<PathBuf>,
    pub data: Option<String>,
    pub include_paths: Vec<PathBuf>,
    pub source_map: bool,
    pub omit_source_map_url: bool,
    pub extra: Map<String, Value>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// DIAGNOSTIC INTERCEPTION
// ============================================================================

/// Diagnostic directives the orchestrator intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Warn,
    Debug,
}

impl Directive {
    /// Name of the at-rule as written in source, without the `@`.
    pub fn name(self) -> &'static str {
        match self {
            Directive::Warn => "warn",
            Directive::Debug => "debug",
        }
    }
}

/// Append-only, order-preserving record of `@warn` and `@debug` messages.
///
/// Owned by a single fixture invocation. Recording a message never writes to
/// stderr; the compiler's default diagnostic output is suppressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSink {
    warnings: Vec<String>,
    debug: Vec<String>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, directive: Directive, message: impl Into<String>) {
        let message = message.into();
        tracing::trace!(directive = directive.name(), %message, "captured compiler diagnostic");
        match directive {
            Directive::Warn => self.warnings.push(message),
            Directive::Debug => self.debug.push(message),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(Directive::Warn, message);
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.record(Directive::Debug, message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn debug_messages(&self) -> &[String] {
        &self.debug
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.warnings, self.debug)
    }
}

// ============================================================================
// COMPILER OUTPUT
// ============================================================================

/// Compiled CSS as the compiler hands it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Css {
    Text(String),
    Bytes(Vec<u8>),
}

impl Css {
    /// Coerces to a plain string. Invalid UTF-8 is replaced, never rejected.
    pub fn into_string(self) -> String {
        match self {
            Css::Text(text) => text,
            Css::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
            },
        }
    }
}

impl From<String> for Css {
    fn from(text: String) -> Self {
        Css::Text(text)
    }
}

impl From<&str> for Css {
    fn from(text: &str) -> Self {
        Css::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Css {
    fn from(bytes: Vec<u8>) -> Self {
        Css::Bytes(bytes)
    }
}

/// Source map as the compiler hands it back: serialized or already parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceMap {
    Json(String),
    Value(Value),
}

impl SourceMap {
    pub fn into_value(self) -> Result<Value, serde_json::Error> {
        match self {
            SourceMap::Json(text) => serde_json::from_str(&text),
            SourceMap::Value(value) => Ok(value),
        }
    }
}

/// Raw result of a successful compile.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub css: Css,
    pub map: Option<SourceMap>,
    /// Engine metadata, forwarded verbatim.
    pub stats: Map<String, Value>,
}

impl CompileOutput {
    pub fn new(css: impl Into<Css>) -> Self {
        Self {
            css: css.into(),
            map: None,
            stats: Map::new(),
        }
    }

    pub fn with_map(mut self, map: SourceMap) -> Self {
        self.map = Some(map);
        self
    }
}

/// A successful compile with its captured diagnostics attached.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileResult {
    pub css: String,
    pub map: Option<Value>,
    pub warn: Vec<String>,
    pub debug: Vec<String>,
    pub stats: Map<String, Value>,
}

impl CompileResult {
    /// Normalizes raw compiler output and attaches the sink's messages.
    pub fn from_output(output: CompileOutput, sink: DiagnosticSink) -> Result<Self, FixtureError> {
        let map = output
            .map
            .map(SourceMap::into_value)
            .transpose()
            .map_err(FixtureError::SourceMap)?;
        let (warn, debug) = sink.into_parts();
        Ok(Self {
            css: output.css.into_string(),
            map,
            warn,
            debug,
            stats: output.stats,
        })
    }
}

// ============================================================================
// COMPILER ERRORS
// ============================================================================

/// Error reported by the compiler, propagated to callers unchanged.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
#[diagnostic(code(sass_fixture::compile))]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub file: PathBuf,
    pub status: i32,
}

// ============================================================================
// THE SEAM
// ============================================================================

/// A style-sheet compiler.
///
/// Implementations must route `@warn`/`@debug` output into `sink` and return
/// either the compiled output or the compiler's own error.
pub trait StyleCompiler: Send + Sync {
    fn compile<'a>(
        &'a self,
        options: &'a CompileOptions,
        sink: &'a mut DiagnosticSink,
    ) -> BoxFuture<'a, Result<CompileOutput, CompileError>>;
}

impl<C: StyleCompiler + ?Sized> StyleCompiler for Box<C> {
    fn compile<'a>(
        &'a self,
        options: &'a CompileOptions,
        sink: &'a mut DiagnosticSink,
    ) -> BoxFuture<'a, Result<CompileOutput, CompileError>> {
        (**self).compile(options, sink)
    }
}

impl<C: StyleCompiler + ?Sized> StyleCompiler for std::sync::Arc<C> {
    fn compile<'a>(
        &'a self,
        options: &'a CompileOptions,
        sink: &'a mut DiagnosticSink,
    ) -> BoxFuture<'a, Result<CompileOutput, CompileError>> {
        (**self).compile(options, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn byte_css_is_coerced_to_text() {
        let css = Css::from(b".a {\n  color: red; }\n".to_vec());
        assert_eq!(css.into_string(), ".a {\n  color: red; }\n");
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let css = Css::Bytes(vec![b'a', 0xff, b'b']);
        assert_eq!(css.into_string(), "a\u{fffd}b");
    }

    #[test]
    fn sink_preserves_emission_order_per_directive() {
        let mut sink = DiagnosticSink::new();
        sink.warn("first");
        sink.debug("dbg");
        sink.record(Directive::Warn, "second");
        assert_eq!(sink.warnings(), ["first", "second"]);
        assert_eq!(sink.debug_messages(), ["dbg"]);
    }

    #[test]
    fn serialized_source_map_is_parsed() {
        let output = CompileOutput::new(".a{}")
            .with_map(SourceMap::Json(r#"{"version":3,"mappings":""}"#.to_string()));
        let mut sink = DiagnosticSink::new();
        sink.warn("careful");

        let result = CompileResult::from_output(output, sink).unwrap();

        assert_eq!(result.map, Some(json!({"version": 3, "mappings": ""})));
        assert_eq!(result.warn, vec!["careful".to_string()]);
        assert!(result.debug.is_empty());
    }

    #[test]
    fn malformed_source_map_is_an_error() {
        let output = CompileOutput::new(".a{}").with_map(SourceMap::Json("{not json".to_string()));
        let err = CompileResult::from_output(output, DiagnosticSink::new()).unwrap_err();
        assert!(matches!(err, FixtureError::SourceMap(_)));
    }
}
