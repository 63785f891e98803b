//! Source file staging.
//!
//! Every input ends up as a [`StagedFile`] on local disk before it is
//! decoded. Remote files live in a temporary directory owned by the
//! handle and are removed when it drops.

pub mod fetcher;

pub use fetcher::{fetch_remote, FetchOptions};

use crate::error::SourceError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Extension and size limits applied to every input.
#[derive(Debug, Clone)]
pub struct SourceLimits {
    /// Accepted file extensions, lowercase, without the dot.
    pub extensions: Vec<String>,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            extensions: vec!["xlsx", "xls", "csv"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

impl From<&crate::config::IngestConfig> for SourceLimits {
    fn from(config: &crate::config::IngestConfig) -> Self {
        Self {
            extensions: config.extensions.iter().map(|e| e.to_lowercase()).collect(),
            max_file_size: config.max_file_size,
        }
    }
}

impl SourceLimits {
    /// Check a file name against the extension allow-list.
    pub fn check_extension(&self, name: &str) -> Result<(), SourceError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if self.extensions.contains(&extension) {
            Ok(())
        } else {
            Err(SourceError::UnsupportedExtension {
                extension,
                allowed: self.extensions.clone(),
            })
        }
    }

    /// Check a size in bytes against the limit.
    pub fn check_size(&self, size: u64) -> Result<(), SourceError> {
        if size > self.max_file_size {
            Err(SourceError::FileTooLarge {
                size,
                limit: self.max_file_size,
            })
        } else {
            Ok(())
        }
    }
}

/// A source file ready to be decoded.
#[derive(Debug)]
pub struct StagedFile {
    /// Path to the file on local disk.
    path: PathBuf,
    /// Where the file came from (path or URL), for reporting.
    origin: String,
    /// Temporary directory handle (keeps the directory alive).
    /// If None, the file is the user's own and is left in place.
    temp_dir: Option<TempDir>,
}

impl StagedFile {
    /// Stage a local file after checking its extension and size.
    pub fn local(path: &Path, limits: &SourceLimits) -> Result<Self, SourceError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        limits.check_extension(name)?;

        let metadata = fs::metadata(path)?;
        limits.check_size(metadata.len())?;

        Ok(Self {
            path: path.to_path_buf(),
            origin: path.display().to_string(),
            temp_dir: None,
        })
    }

    /// Wrap a file written inside a temporary directory.
    pub(crate) fn temporary(path: PathBuf, origin: String, temp_dir: TempDir) -> Self {
        Self {
            path,
            origin,
            temp_dir: Some(temp_dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Some(ref temp_dir) = self.temp_dir {
            debug!(
                "Cleaning up temporary directory: {}",
                temp_dir.path().display()
            );
        }
    }
}
