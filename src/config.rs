//! Path configuration for fixture lookup and compiler include paths.
//!
//! Defaults follow the host-project layout: fixtures under
//! `<host>/test/fixtures` and shared style modules under `<host>/scss`.
//! Overrides are partial; a field that is absent or empty in an update never
//! resets the stored value.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FixtureError;

const FIXTURES_DIR: &str = "test/fixtures";
const MODULE_DIR: &str = "scss";

/// Levels between the helper's install location and the host project root.
const INSTALL_DEPTH: usize = 3;

/// Defaults are computed once per process and cloned into each session.
static DEFAULT_PATHS: Lazy<PathConfig> = Lazy::new(|| {
    let config = PathConfig::for_host_root(host_root());
    tracing::debug!(
        fixtures_root = %config.fixtures_root.display(),
        module_root = %config.module_root.display(),
        "resolved default fixture paths"
    );
    config
});

/// The package under test. `cargo test` exports `CARGO_MANIFEST_DIR` to the
/// test binary; outside cargo the working directory stands in.
fn host_root() -> PathBuf {
    env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    pub fixtures_root: PathBuf,
    pub module_root: PathBuf,
    pub include_paths: Vec<PathBuf>,
}

impl PathConfig {
    /// Layout rooted at `root`: `root/test/fixtures` and `root/scss`.
    pub fn for_host_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let module_root = root.join(MODULE_DIR);
        Self {
            fixtures_root: root.join(FIXTURES_DIR),
            include_paths: vec![module_root.clone()],
            module_root,
        }
    }

    /// Layout for a helper installed three directories below the host root,
    /// e.g. `<host>/vendor/sass-fixture/src`.
    pub fn from_install_location(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let root = dir.ancestors().nth(INSTALL_DEPTH).unwrap_or(dir);
        Self::for_host_root(root)
    }

    /// Merges a partial update. Absent or empty fields are ignored.
    pub fn apply(&mut self, update: PathUpdate) {
        if let Some(root) = update.fixtures_root.filter(|p| !p.as_os_str().is_empty()) {
            self.fixtures_root = root;
        }
        if let Some(root) = update.module_root.filter(|p| !p.as_os_str().is_empty()) {
            self.module_root = root;
        }
        if let Some(paths) = update.include_paths.filter(|p| !p.is_empty()) {
            self.include_paths = paths;
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        DEFAULT_PATHS.clone()
    }
}

/// A partial [`PathConfig`].
///
/// Accepts both the camelCase keys used by JavaScript tooling configs and
/// snake_case keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathUpdate {
    #[serde(alias = "fixturesRoot")]
    pub fixtures_root: Option<PathBuf>,
    #[serde(alias = "moduleRoot")]
    pub module_root: Option<PathBuf>,
    #[serde(alias = "includePaths")]
    pub include_paths: Option<Vec<PathBuf>>,
}

impl PathUpdate {
    pub fn fixtures_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.fixtures_root = Some(path.into());
        self
    }

    pub fn module_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.module_root = Some(path.into());
        self
    }

    pub fn include_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    /// Reads an update from a `.json`, `.yaml` or `.yml` file.
    ///
    /// Relative paths in the file are resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let config_error = |reason: String| FixtureError::Config {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        let update: PathUpdate = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| config_error(e.to_string()))?
        };

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(update.resolved_against(base))
    }

    fn resolved_against(self, base: &Path) -> Self {
        let resolve = |p: PathBuf| {
            if p.is_relative() && !p.as_os_str().is_empty() {
                base.join(p)
            } else {
                p
            }
        };
        Self {
            fixtures_root: self.fixtures_root.map(resolve),
            module_root: self.module_root.map(resolve),
            include_paths: self
                .include_paths
                .map(|paths| paths.into_iter().map(resolve).collect()),
        }
    }
}
