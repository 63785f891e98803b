//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// co2dash - energy and CO2 indicators from corporate spreadsheets
///
/// Reads a spreadsheet of company energy consumption and CO2 emission
/// records and produces yearly totals, per-company averages, top emitters
/// and a sector breakdown, as JSON for dashboards or as a Markdown report.
///
/// Examples:
///   co2dash --input Dados_DGEG.xlsx
///   co2dash --input dados.csv --delimiter ';' --format json --output -
///   co2dash --url https://example.org/emissoes.xlsx --format json
///   co2dash --dir ./relatorios --concurrency 8
///   co2dash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Spreadsheet file to analyze (.xlsx, .xls or .csv)
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present_any = ["url", "dir", "init_config"],
        conflicts_with_all = ["url", "dir"]
    )]
    pub input: Option<PathBuf>,

    /// Download the spreadsheet from an HTTP(S) URL
    #[arg(long, value_name = "URL", conflicts_with = "dir")]
    pub url: Option<String>,

    /// Analyze every spreadsheet found under a directory
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Output file path for the report ("-" for stdout)
    ///
    /// Defaults to the config file setting, or co2dash_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .co2dash.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "CO2DASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of companies listed as top emitters
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Minimum number of valid rows required
    #[arg(long, value_name = "N")]
    pub min_valid_rows: Option<usize>,

    /// Worksheet to read (defaults to the first sheet)
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Field delimiter for CSV files
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Number of files processed at once with --dir
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Download timeout in seconds for --url
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fail if any file skipped more than this many rows
    ///
    /// Useful for CI pipelines. Exit code 2 when the threshold is exceeded.
    #[arg(long, value_name = "COUNT")]
    pub max_skipped: Option<usize>,

    /// Dry run: decode and check the columns without computing indicators
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .co2dash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        if let Some(ref dir) = self.dir {
            if !dir.is_dir() {
                return Err(format!("Not a directory: {}", dir.display()));
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() {
                return Err("Delimiter must be a single ASCII character".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
