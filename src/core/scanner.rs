use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub extension: String,
}

/// Discovers Python source units below a root directory.
pub struct FileScanner {
    extensions: HashSet<String>,
    exclude_dirs: HashSet<String>,
    exclude_patterns: Vec<Regex>,
}

impl FileScanner {
    pub fn new() -> Self {
        Self::from_parts(&AnalyzerConfig::default(), Vec::new())
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let patterns = config.compiled_exclude_patterns()?;
        Ok(Self::from_parts(config, patterns))
    }

    fn from_parts(config: &AnalyzerConfig, exclude_patterns: Vec<Regex>) -> Self {
        Self {
            extensions: config.extensions.iter().cloned().collect(),
            exclude_dirs: config.exclude_dirs.iter().cloned().collect(),
            exclude_patterns,
        }
    }

    /// Source files below `root_path`, in a stable (file-name sorted) order.
    pub fn scan_directory(&self, root_path: &Path) -> Result<Vec<FileInfo>> {
        if !root_path.exists() {
            return Err(AnalysisError::Io {
                path: root_path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "path does not exist"),
            });
        }

        let entries: Vec<DirEntry> = WalkDir::new(root_path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded_dir(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Skipping unreadable entry under {}: {}", root_path.display(), err);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .collect();

        // Order-preserving parallel filter
        let files: Vec<FileInfo> = entries
            .par_iter()
            .filter_map(|entry| self.accept(entry.path()))
            .collect();

        Ok(files)
    }

    /// `Some` when `path` is a source file this scanner would report.
    pub fn accept(&self, path: &Path) -> Option<FileInfo> {
        let extension = path.extension().and_then(|ext| ext.to_str())?;
        if !self.extensions.contains(extension) {
            return None;
        }

        let display = path.to_string_lossy().replace('\\', "/");
        if self.exclude_patterns.iter().any(|re| re.is_match(&display)) {
            return None;
        }

        Some(FileInfo {
            path: path.to_path_buf(),
            extension: extension.to_string(),
        })
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.exclude_dirs.contains(name))
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}
