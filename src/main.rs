//! co2dash - energy and CO2 indicators from corporate spreadsheets
//!
//! A CLI tool that reads company energy consumption and CO2 emission
//! records from a workbook or CSV file and produces the indicator set
//! shown on the emissions dashboard.
//!
//! Exit codes:
//!   0 - Success (no --max-skipped set, or threshold respected)
//!   1 - Runtime error (unreadable file, missing columns, download failure, etc.)
//!   2 - A file skipped more rows than --max-skipped allows

mod analysis;
mod batch;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod pipeline;
mod report;
mod scanner;
mod source;

use analysis::AnalysisSettings;
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::Report;
use pipeline::PipelineSettings;
use report::MarkdownOptions;
use source::{FetchOptions, SourceLimits, StagedFile};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("co2dash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .co2dash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize extensions, limits, year range, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so a report written to stdout stays clean.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Human-facing progress messages.
///
/// Printed to stdout normally, to stderr when the report itself goes to
/// stdout, and not at all in quiet mode.
struct Console {
    quiet: bool,
    to_stderr: bool,
}

impl Console {
    fn say(&self, message: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        if self.to_stderr {
            eprintln!("{}", message.as_ref());
        } else {
            println!("{}", message.as_ref());
        }
    }
}

/// Run the selected mode. Returns exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let console = Console {
        quiet: args.quiet,
        to_stderr: config.general.writes_to_stdout(),
    };

    let settings = PipelineSettings {
        analysis: AnalysisSettings::from(&config.indicators),
        decode: config.decode_options(),
    };

    if let Some(ref dir) = args.dir {
        return run_directory(dir, &args, &config, settings, &console).await;
    }

    let staged = stage_source(&args, &config, &console).await?;
    info!("Reading {}", staged.path().display());

    if args.dry_run {
        return handle_dry_run(&staged, &settings, &console);
    }

    console.say("\n🔬 Computing indicators...");

    let path = staged.path().to_path_buf();
    let origin = staged.origin().to_string();
    let task = move || pipeline::build_report(&path, &origin, &settings);
    let report = tokio::task::spawn_blocking(task)
        .await
        .context("Indicator task panicked")??;

    // Remove any downloaded copy before writing output
    drop(staged);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, &MarkdownOptions::from(&config.report))
        }
    };
    write_output(&config, &output)?;

    print_summary(&report, &console);
    if !config.general.writes_to_stdout() {
        console.say(format!("\n✅ Report saved to: {}", config.general.output));
    }

    if let Some(max_skipped) = args.max_skipped {
        if exceeds_skip_threshold(&report, max_skipped) {
            eprintln!(
                "\n⛔ {} rows skipped, more than the allowed {}. Failing (exit code 2).",
                report.indicators.skipped_rows, max_skipped
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Download or locate the single input file.
async fn stage_source(args: &Args, config: &Config, console: &Console) -> Result<StagedFile> {
    let limits = SourceLimits::from(&config.ingest);

    if let Some(ref url) = args.url {
        console.say(format!("📥 Downloading: {}", url));
        let options = FetchOptions {
            timeout_seconds: config.fetch.timeout_seconds,
            show_progress: !args.quiet,
            temp_root: config.fetch.temp_dir.as_ref().map(PathBuf::from),
        };
        return source::fetch_remote(url, &limits, &options)
            .await
            .with_context(|| format!("Failed to download {}", url));
    }

    let input = args
        .input
        .as_ref()
        .context("No input given; use --input, --url or --dir")?;
    console.say(format!("📄 Input: {}", input.display()));
    StagedFile::local(input, &limits)
        .with_context(|| format!("Cannot use {}", input.display()))
}

/// Handle --dry-run for one file: decode and check columns, exit.
fn handle_dry_run(
    staged: &StagedFile,
    settings: &PipelineSettings,
    console: &Console,
) -> Result<i32> {
    console.say("\n🔍 Dry run: checking columns (no indicators computed)...\n");

    let check = pipeline::check_schema(staged.path(), settings)
        .with_context(|| format!("Schema check failed for {}", staged.origin()))?;

    console.say(format!("   Data rows: {}", check.data_rows));
    console.say(format!("   Columns: {}", check.columns.join(", ")));
    console.say("\n✅ Dry run complete. All required columns are present.");
    Ok(0)
}

/// Directory mode: scan, process every file, write one combined report.
async fn run_directory(
    dir: &Path,
    args: &Args,
    config: &Config,
    settings: PipelineSettings,
    console: &Console,
) -> Result<i32> {
    console.say(format!("📂 Scanning directory: {}", dir.display()));

    let scan_config = scanner::ScanConfig::from(&config.ingest);
    let file_scanner = scanner::FileScanner::new(dir.to_path_buf(), scan_config);
    let files = file_scanner.scan()?;

    if files.is_empty() {
        console.say("   No spreadsheet files found.");
        return Ok(0);
    }
    console.say(format!("   Found {} spreadsheet files", files.len()));

    if args.dry_run {
        console.say("\n🔍 Dry run: checking columns (no indicators computed)...\n");
        for file in &files {
            match pipeline::check_schema(&file.path, &settings) {
                Ok(check) => console.say(format!(
                    "     📄 {} ({} bytes, {} data rows)",
                    file.relative, file.size, check.data_rows
                )),
                Err(e) => console.say(format!("     ❌ {}: {:#}", file.relative, e)),
            }
        }
        console.say(format!("\n   Total: {} files", files.len()));
        console.say("\n✅ Dry run complete.");
        return Ok(0);
    }

    let inputs: Vec<batch::BatchInput> = files
        .into_iter()
        .map(|file| batch::BatchInput {
            path: file.path,
            label: file.relative,
        })
        .collect();

    console.say("\n🔬 Computing indicators...");
    let started = Instant::now();
    let progress = !args.quiet && !config.general.writes_to_stdout();
    let jobs = config.general.concurrency;
    let entries = batch::run_batch(inputs, settings, jobs, progress).await;

    let output = match args.format {
        OutputFormat::Json => report::generate_batch_json(&entries)?,
        OutputFormat::Markdown => {
            report::generate_batch_markdown(&entries, &MarkdownOptions::from(&config.report))
        }
    };
    write_output(config, &output)?;

    let succeeded = entries.iter().filter(|e| e.is_success()).count();
    let failed = entries.len() - succeeded;

    console.say("\n📊 Batch Summary:");
    console.say(format!("   Files processed: {}", succeeded));
    console.say(format!("   Files failed: {}", failed));
    let elapsed = started.elapsed().as_secs_f64();
    console.say(format!("   Duration: {:.1}s", elapsed));
    if !config.general.writes_to_stdout() {
        console.say(format!("\n✅ Report saved to: {}", config.general.output));
    }

    if succeeded == 0 {
        anyhow::bail!("None of the {} files could be processed", entries.len());
    }

    if let Some(max_skipped) = args.max_skipped {
        let offenders: Vec<&str> = entries
            .iter()
            .filter(|e| {
                e.report
                    .as_ref()
                    .is_some_and(|r| exceeds_skip_threshold(r, max_skipped))
            })
            .map(|e| e.source.as_str())
            .collect();

        if !offenders.is_empty() {
            eprintln!(
                "\n⛔ More than {} rows skipped in: {}. Failing (exit code 2).",
                max_skipped,
                offenders.join(", ")
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Print the headline figures of one report.
fn print_summary(report: &Report, console: &Console) {
    let indicators = &report.indicators;
    let used = indicators.raw_data_count;
    let skipped = indicators.skipped_rows;
    let companies = indicators.company_count();
    let sectors = indicators.sector_count();
    let years = indicators.years.len();

    console.say("\n📊 Indicator Summary:");
    console.say(format!("   Rows used: {} | skipped: {}", used, skipped));
    console.say(format!(
        "   Companies: {} | Sectors: {} | Years: {}",
        companies, sectors, years
    ));
    console.say(format!("   Total emissions: {:.2} t CO2", indicators.total_emissions()));
    if let Some(top) = indicators.top_companies.first() {
        let (name, total) = (&top.company, top.total_emissions);
        console.say(format!("   Top emitter: {} ({:.2} t CO2)", name, total));
    }
    let duration = report.metadata.duration_seconds;
    console.say(format!("   Duration: {:.1}s", duration));
}

fn exceeds_skip_threshold(report: &Report, max_skipped: usize) -> bool {
    report.indicators.skipped_rows > max_skipped
}

/// Write the rendered report to the configured file, or stdout for "-".
fn write_output(config: &Config, content: &str) -> Result<()> {
    if config.general.writes_to_stdout() {
        print!("{}", content);
        return Ok(());
    }

    let path = PathBuf::from(&config.general.output);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
