//! Error types for dataset decoding, indicator aggregation and source staging.

use thiserror::Error;

/// Errors that end an indicator run for one source.
///
/// Row-level problems never surface here: they are skipped and counted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    /// The source file could not be decoded into a dataset.
    #[error("Failed to decode spreadsheet: {0}")]
    Decode(String),

    /// One or more required columns are absent from the header row.
    #[error("Missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Every data row was rejected by validation.
    #[error("No valid data rows found in the file")]
    EmptyDataset,

    /// Some rows were valid, but not enough to compute indicators.
    #[error("File contains too few valid rows: {found} (minimum {required})")]
    InsufficientData { found: usize, required: usize },
}

/// Errors raised while locating, downloading or checking a source file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file extension is not in the allow-list.
    #[error("Unsupported file type '{extension}'. Allowed: {}", allowed.join(", "))]
    UnsupportedExtension {
        extension: String,
        allowed: Vec<String>,
    },

    /// The file exceeds the configured size limit.
    #[error("File too large: {size} bytes (maximum {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    /// A remote download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Download(err.to_string())
    }
}
