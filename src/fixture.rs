//! Fixture path resolution and discovery.
//!
//! A fixture is a directory under the fixtures root holding `input.scss` (the
//! compiler entry point, always imported rather than read) and `output.css`
//! (the expected compiled output).

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::config::PathConfig;
use crate::error::FixtureError;

pub const INPUT_FILE: &str = "input.scss";
pub const OUTPUT_FILE: &str = "output.css";

/// Module name the entry import refers to (`input.scss` without extension).
const INPUT_MODULE: &str = "input";

/// Joins the fixtures root with `segments`, in order. No I/O.
///
/// With no segments this is the fixtures root itself.
pub fn fixture<I, S>(config: &PathConfig, segments: I) -> PathBuf
where
    I: IntoIterator<Item = S>,
    S: AsRef<Path>,
{
    segments
        .into_iter()
        .fold(config.fixtures_root.clone(), |path, segment| path.join(segment))
}

/// Paths and entry source for one fixture directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePaths {
    pub name: String,
    pub source: PathBuf,
    pub output: PathBuf,
}

impl FixturePaths {
    pub fn resolve(config: &PathConfig, name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: fixture(config, [name, INPUT_FILE]),
            output: fixture(config, [name, OUTPUT_FILE]),
        }
    }

    /// `@import "<name>/input";`, resolved by the compiler through its include
    /// paths (the fixtures root among them).
    pub fn entry_source(&self) -> String {
        let module = Path::new(&self.name).join(INPUT_MODULE);
        format!("@import \"{}\";", import_path(&module))
    }
}

/// Import statements always use forward slashes.
fn import_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Recursively finds fixture directories under `root`.
///
/// Returns fixture names relative to `fixtures_root`, sorted so a suite runs
/// in a deterministic order.
pub fn discover_fixtures(
    config: &PathConfig,
    root: impl AsRef<Path>,
) -> Result<Vec<String>, FixtureError> {
    let root = root.as_ref();
    let mut names = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| FixtureError::Io {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;

        if !entry.file_type().is_file() || entry.file_name() != INPUT_FILE {
            continue;
        }

        let Some(dir) = entry.path().parent() else {
            continue;
        };
        let relative = dir.strip_prefix(&config.fixtures_root).unwrap_or(dir);
        names.push(import_path(relative));
    }
    names.sort();
    tracing::debug!(root = %root.display(), count = names.len(), "discovered fixtures");
    Ok(names)
}
