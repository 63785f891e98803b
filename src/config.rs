//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.co2dash.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".co2dash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Indicator settings.
    #[serde(default)]
    pub indicators: IndicatorsConfig,

    /// Input file settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Remote download settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Number of files processed at once in directory mode.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl GeneralConfig {
    /// Whether the report goes to standard output.
    pub fn writes_to_stdout(&self) -> bool {
        self.output == "-"
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_output() -> String {
    "co2dash_report.md".to_string()
}

fn default_concurrency() -> usize {
    4
}

/// Indicator computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorsConfig {
    /// Number of companies listed as top emitters.
    #[serde(default = "default_top_companies")]
    pub top_companies: usize,

    /// Minimum number of valid rows required.
    #[serde(default = "default_min_valid_rows")]
    pub min_valid_rows: usize,

    /// Earliest accepted year.
    #[serde(default = "default_min_year")]
    pub min_year: i32,

    /// Latest accepted year.
    #[serde(default = "default_max_year")]
    pub max_year: i32,
}

impl Default for IndicatorsConfig {
    fn default() -> Self {
        Self {
            top_companies: default_top_companies(),
            min_valid_rows: default_min_valid_rows(),
            min_year: default_min_year(),
            max_year: default_max_year(),
        }
    }
}

fn default_top_companies() -> usize {
    5
}

fn default_min_valid_rows() -> usize {
    3
}

fn default_min_year() -> i32 {
    1900
}

fn default_max_year() -> i32 {
    2100
}

/// Input file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Accepted file extensions.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Names skipped when scanning a directory.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,

    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Maximum files processed in directory mode.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Field delimiter for CSV files.
    #[serde(default = "default_csv_delimiter")]
    pub csv_delimiter: char,

    /// Worksheet to read; the first one when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            excludes: default_excludes(),
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
            csv_delimiter: default_csv_delimiter(),
            sheet: None,
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["xlsx", "xls", "csv"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_excludes() -> Vec<String> {
    vec!["target", "node_modules", "uploads"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_max_files() -> usize {
    100
}

fn default_csv_delimiter() -> char {
    ','
}

/// Remote download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Directory that holds download temp dirs (system temp dir if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            temp_dir: None,
        }
    }
}

fn default_timeout() -> u64 {
    60
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the per-company average consumption table.
    #[serde(default = "default_true")]
    pub include_company_averages: bool,

    /// Include the skipped-row breakdown.
    #[serde(default = "default_true")]
    pub include_skip_breakdown: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_company_averages: true,
            include_skip_breakdown: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Reject settings that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.indicators.min_year > self.indicators.max_year {
            anyhow::bail!(
                "min_year ({}) is after max_year ({})",
                self.indicators.min_year,
                self.indicators.max_year
            );
        }
        if self.indicators.top_companies == 0 {
            anyhow::bail!("top_companies must be at least 1");
        }
        if self.general.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        if !self.ingest.csv_delimiter.is_ascii() {
            anyhow::bail!("csv_delimiter must be a single ASCII character");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }

        if let Some(top) = args.top {
            self.indicators.top_companies = top;
        }
        if let Some(min_rows) = args.min_valid_rows {
            self.indicators.min_valid_rows = min_rows;
        }

        if let Some(ref sheet) = args.sheet {
            self.ingest.sheet = Some(sheet.clone());
        }
        if let Some(delimiter) = args.delimiter {
            self.ingest.csv_delimiter = delimiter;
        }

        if let Some(timeout) = args.timeout {
            self.fetch.timeout_seconds = timeout;
        }

        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
    }

    /// Decoder options derived from the ingest settings.
    pub fn decode_options(&self) -> crate::dataset::DecodeOptions {
        crate::dataset::DecodeOptions {
            sheet: self.ingest.sheet.clone(),
            csv_delimiter: self.ingest.csv_delimiter as u8,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
