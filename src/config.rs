use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::resolver::AttributeTypePolicy;
use crate::error::{AnalysisError, Result};

pub const DEFAULT_EXTENSIONS: &[&str] = &["py", "pyi", "pyw"];

pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    "__pycache__",
    "venv",
    ".venv",
    ".git",
    "node_modules",
    "build",
    "dist",
    ".tox",
    ".mypy_cache",
];

/// Analyzer settings, loadable from an `impactgraph.toml` file.
///
/// Every field is optional in the file; missing fields take their default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Parse and traverse units on the rayon pool.
    pub parallel: bool,
    pub attribute_policy: AttributeTypePolicy,
    /// File extensions (without the dot) treated as Python sources.
    pub extensions: Vec<String>,
    /// Directory names pruned during discovery, wherever they appear.
    pub exclude_dirs: Vec<String>,
    /// Regular expressions matched against discovered paths.
    pub exclude_patterns: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            attribute_policy: AttributeTypePolicy::default(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl AnalyzerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|err| AnalysisError::Config(err.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| AnalysisError::Config(err.to_string()))
    }

    pub fn compiled_exclude_patterns(&self) -> Result<Vec<Regex>> {
        self.exclude_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|err| {
                    AnalysisError::Config(format!("bad exclude pattern `{pattern}`: {err}"))
                })
            })
            .collect()
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("impactgraph.toml")
}

/// Load the configuration at `path`, or the default path when `None`.
///
/// A missing file at the default path yields the defaults; a missing file at
/// an explicit path is an error.
pub fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (default_config_path(), false),
    };

    if !path.exists() && !explicit {
        return Ok(AnalyzerConfig::default());
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| AnalysisError::Io {
        path: path.clone(),
        source,
    })?;
    AnalyzerConfig::from_toml_str(&contents)
}
