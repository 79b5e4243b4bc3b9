//! Shared test support: a line-oriented stand-in for a real style-sheet
//! compiler.
//!
//! `LineCompiler` understands just enough to exercise the orchestrator:
//! `@import` resolved through include paths (partials included), the
//! `@warn`/`@debug`/`@error` directives, and verbatim pass-through of every
//! other line. Output is returned as bytes and the source map as a JSON
//! string so result normalization is exercised on every run.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use futures::future::BoxFuture;
use sass_fixture::{
    CompileError, CompileOptions, CompileOutput, Css, DiagnosticSink, SourceMap, StyleCompiler,
};
use serde_json::json;

const MAX_IMPORT_DEPTH: usize = 16;

#[derive(Default)]
pub struct LineCompiler {
    last_options: Mutex<Option<CompileOptions>>,
}

impl LineCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options of the most recent compile.
    pub fn last_options(&self) -> Option<CompileOptions> {
        self.last_options.lock().unwrap().clone()
    }

    fn compile_sync(
        &self,
        options: &CompileOptions,
        sink: &mut DiagnosticSink,
    ) -> Result<CompileOutput, CompileError> {
        *self.last_options.lock().unwrap() = Some(options.clone());

        let entry = PathBuf::from("stdin");
        let mut lines = Vec::new();
        let mut sources = Vec::new();
        let data = options.data.clone().unwrap_or_default();
        process(&data, &entry, options, sink, &mut lines, &mut sources, 0)?;

        let css = if lines.is_empty() {
            String::new()
        } else {
            format!("{}\n", lines.join("\n"))
        };
        let map = json!({
            "version": 3,
            "file": options.out_file.as_ref().map(|p| p.display().to_string()),
            "sources": sources,
            "mappings": "",
        });

        let mut output = CompileOutput::new(Css::Bytes(css.into_bytes()))
            .with_map(SourceMap::Json(map.to_string()));
        output.stats.insert("includedFiles".to_string(), json!(sources.len()));
        Ok(output)
    }
}

impl StyleCompiler for LineCompiler {
    fn compile<'a>(
        &'a self,
        options: &'a CompileOptions,
        sink: &'a mut DiagnosticSink,
    ) -> BoxFuture<'a, Result<CompileOutput, CompileError>> {
        Box::pin(async move { self.compile_sync(options, sink) })
    }
}

/// Yields to the scheduler `polls` times before delegating, so the file read
/// settles first.
pub struct Slow<C> {
    pub inner: C,
    pub polls: usize,
}

impl<C: StyleCompiler> StyleCompiler for Slow<C> {
    fn compile<'a>(
        &'a self,
        options: &'a CompileOptions,
        sink: &'a mut DiagnosticSink,
    ) -> BoxFuture<'a, Result<CompileOutput, CompileError>> {
        Box::pin(async move {
            for _ in 0..self.polls {
                tokio::task::yield_now().await;
            }
            self.inner.compile(options, sink).await
        })
    }
}

fn process(
    source: &str,
    file: &Path,
    options: &CompileOptions,
    sink: &mut DiagnosticSink,
    lines: &mut Vec<String>,
    sources: &mut Vec<String>,
    depth: usize,
) -> Result<(), CompileError> {
    for (index, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        let error = |message: String| CompileError {
            message,
            line: index + 1,
            column: line.len() - trimmed.len() + 1,
            file: file.to_path_buf(),
            status: 1,
        };

        if let Some(target) = argument(trimmed, "@import") {
            if depth >= MAX_IMPORT_DEPTH {
                return Err(error("An @import loop has been found.".to_string()));
            }
            let Some(path) = resolve_import(&target, file, &options.include_paths) else {
                return Err(error(format!(
                    "File to import not found or unreadable: {target}."
                )));
            };
            let content = fs::read_to_string(&path).map_err(|e| error(e.to_string()))?;
            sources.push(path.display().to_string());
            process(&content, &path, options, sink, lines, sources, depth + 1)?;
        } else if let Some(message) = argument(trimmed, "@warn") {
            sink.warn(message);
        } else if let Some(message) = argument(trimmed, "@debug") {
            sink.debug(message);
        } else if let Some(message) = argument(trimmed, "@error") {
            return Err(error(message));
        } else {
            lines.push(line.to_string());
        }
    }
    Ok(())
}

/// `@rule "value";` -> `value`.
fn argument(line: &str, rule: &str) -> Option<String> {
    let rest = line.strip_prefix(rule)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let value = rest.trim().trim_end_matches(';').trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Some(value.to_string())
}

/// The importing file's directory first, then each include path in order.
fn resolve_import(target: &str, importer: &Path, include_paths: &[PathBuf]) -> Option<PathBuf> {
    let target = Path::new(target);
    let file_name = target.file_name()?.to_string_lossy().into_owned();
    let partial = target.with_file_name(format!("_{file_name}.scss"));
    let plain = target.with_file_name(format!("{file_name}.scss"));

    importer
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .into_iter()
        .chain(include_paths.iter().map(PathBuf::as_path))
        .flat_map(|base| [base.join(&plain), base.join(&partial)])
        .find(|candidate| candidate.is_file())
}
