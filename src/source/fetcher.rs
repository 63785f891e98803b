//! Remote spreadsheet download.
//!
//! Downloads a workbook over HTTP(S) into a fresh temporary directory,
//! enforcing the extension and size limits while the body streams in.

use super::{SourceLimits, StagedFile};
use crate::error::SourceError;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Options for downloading a remote file.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Whether to show progress.
    pub show_progress: bool,
    /// Parent directory for the temporary download directory.
    /// The system temp directory when `None`.
    pub temp_root: Option<PathBuf>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            show_progress: true,
            temp_root: None,
        }
    }
}

/// Extract the file name from the last path segment of a URL.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(String::from)
}

/// Download a spreadsheet into a temporary directory.
///
/// The returned handle owns the directory; dropping it, on success or
/// after a later failure, removes the file.
pub async fn fetch_remote(
    url: &str,
    limits: &SourceLimits,
    options: &FetchOptions,
) -> Result<StagedFile, SourceError> {
    info!("Downloading spreadsheet: {}", url);

    let file_name = file_name_from_url(url)
        .ok_or_else(|| SourceError::Download(format!("Cannot determine file name from {}", url)))?;
    limits.check_extension(&file_name)?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(options.timeout_seconds))
        .build()?;

    let mut response = client.get(url).send().await?.error_for_status()?;

    if let Some(length) = response.content_length() {
        limits.check_size(length)?;
    }

    let temp_dir = match options.temp_root {
        Some(ref root) => TempDir::new_in(root)?,
        None => TempDir::new()?,
    };
    let path = temp_dir.path().join(&file_name);
    debug!("Download target: {}", path.display());

    let progress_bar = if options.show_progress {
        let pb = ProgressBar::new(response.content_length().unwrap_or(0));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut file = tokio::fs::File::create(&path).await?;
    let mut received: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        received += chunk.len() as u64;
        limits.check_size(received)?;
        file.write_all(&chunk).await?;

        if let Some(ref pb) = progress_bar {
            pb.set_position(received);
        }
    }
    file.flush().await?;

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Download complete");
    }

    info!("Downloaded {} bytes to {}", received, path.display());

    Ok(StagedFile::temporary(path, url.to_string(), temp_dir))
}
