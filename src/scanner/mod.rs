//! File scanner for discovering spreadsheet files.
//!
//! This module walks a directory and yields the files that batch mode
//! should analyze, honoring extension, exclude and size settings.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for file scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to include (e.g., ["xlsx", "csv"])
    pub extensions: Vec<String>,
    /// Names to exclude (e.g., ["node_modules", "uploads"])
    pub excludes: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: u64,
    /// Maximum number of files to return
    pub max_files: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["xlsx", "xls", "csv"]
                .into_iter()
                .map(String::from)
                .collect(),
            excludes: vec!["target", "node_modules"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_size: 10 * 1024 * 1024,
            max_files: None,
        }
    }
}

impl From<&crate::config::IngestConfig> for ScanConfig {
    fn from(config: &crate::config::IngestConfig) -> Self {
        Self {
            extensions: config.extensions.iter().map(|e| e.to_lowercase()).collect(),
            excludes: config.excludes.clone(),
            max_file_size: config.max_file_size,
            max_files: Some(config.max_files),
        }
    }
}

/// Scanned file information.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Absolute or root-joined path
    pub path: PathBuf,
    /// Path relative to the scan root
    pub relative: String,
    /// File size in bytes
    pub size: u64,
}

/// File scanner for discovering spreadsheet files.
pub struct FileScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl FileScanner {
    /// Create a new file scanner.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Scan for all matching files, sorted by path.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Cannot read entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.has_allowed_extension(entry.path()) {
                continue;
            }

            let metadata = entry
                .metadata()
                .with_context(|| format!("Failed to stat {}", entry.path().display()))?;

            if metadata.len() > self.config.max_file_size {
                warn!(
                    "Skipping {} ({} bytes exceeds the {} byte limit)",
                    entry.path().display(),
                    metadata.len(),
                    self.config.max_file_size
                );
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();

            files.push(ScannedFile {
                path: entry.path().to_path_buf(),
                relative,
                size: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.relative.cmp(&b.relative));

        // Apply max_files limit if set
        if let Some(max) = self.config.max_files {
            files.truncate(max);
        }

        Ok(files)
    }

    /// Check if a path has one of the configured extensions.
    pub fn has_allowed_extension(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        self.config.extensions.contains(&ext)
    }

    /// Check if an entry matches exclusion patterns.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();

        // Hidden files, and spreadsheet lock files such as "~$Dados.xlsx"
        if name.starts_with('.') || name.starts_with("~$") {
            return true;
        }

        self.config.excludes.iter().any(|pattern| name == pattern.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, size: usize) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![b'x'; size]).unwrap();
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.csv", 10);
        touch(dir.path(), "a.XLSX", 10);
        touch(dir.path(), "notes.txt", 10);
        touch(dir.path(), "nested/c.xls", 10);
        touch(dir.path(), ".hidden/d.csv", 10);
        touch(dir.path(), "node_modules/e.csv", 10);
        touch(dir.path(), "~$a.xlsx", 10);

        let scanner = FileScanner::new(dir.path().to_path_buf(), ScanConfig::default());
        let files = scanner.scan().unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();

        let nested = Path::new("nested").join("c.xls").to_string_lossy().to_string();
        assert_eq!(names, vec!["a.XLSX", "b.csv", nested.as_str()]);
    }

    #[test]
    fn test_scan_skips_oversized_and_limits_count() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "big.csv", 500);
        touch(dir.path(), "one.csv", 10);
        touch(dir.path(), "two.csv", 10);

        let config = ScanConfig {
            max_file_size: 100,
            max_files: Some(1),
            ..ScanConfig::default()
        };
        let files = FileScanner::new(dir.path().to_path_buf(), config)
            .scan()
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, "one.csv");
        assert_eq!(files[0].size, 10);
    }

    #[test]
    fn test_has_allowed_extension() {
        let scanner = FileScanner::new(PathBuf::from("."), ScanConfig::default());
        assert!(scanner.has_allowed_extension(Path::new("x.xlsx")));
        assert!(scanner.has_allowed_extension(Path::new("x.CSV")));
        assert!(!scanner.has_allowed_extension(Path::new("x.pdf")));
    }
}
