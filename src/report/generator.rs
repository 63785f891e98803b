//! Markdown and JSON report generation.
//!
//! This module renders indicator reports for people (Markdown) and for
//! dashboards (JSON with the indicator keys at the top level).

use crate::batch::BatchEntry;
use crate::models::{Indicators, Report, ReportMetadata, SkipSummary};
use anyhow::Result;

/// Which optional sections to render.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownOptions {
    pub include_company_averages: bool,
    pub include_skip_breakdown: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            include_company_averages: true,
            include_skip_breakdown: true,
        }
    }
}

impl From<&crate::config::ReportConfig> for MarkdownOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            include_company_averages: config.include_company_averages,
            include_skip_breakdown: config.include_skip_breakdown,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &MarkdownOptions) -> String {
    let mut output = String::new();

    output.push_str("# Emissions & Energy Indicators\n\n");
    output.push_str(&generate_body(report, options, "##"));
    output.push_str(&generate_footer());

    output
}

/// Sections shared by single and batch reports, at the given heading level.
fn generate_body(report: &Report, options: &MarkdownOptions, h: &str) -> String {
    let indicators = &report.indicators;
    let mut body = String::new();

    body.push_str(&generate_metadata_section(&report.metadata, indicators, h));
    body.push_str(&generate_key_figures_section(indicators, h));
    body.push_str(&generate_yearly_section(indicators, h));
    body.push_str(&generate_top_companies_section(indicators, h));
    if options.include_company_averages {
        body.push_str(&generate_company_averages_section(indicators, h));
    }
    body.push_str(&generate_sector_section(indicators, h));
    if options.include_skip_breakdown {
        body.push_str(&generate_skipped_section(&report.metadata.skipped, h));
    }

    body
}

/// Generate the metadata section.
fn generate_metadata_section(
    metadata: &ReportMetadata,
    indicators: &Indicators,
    h: &str,
) -> String {
    let mut section = String::new();

    section.push_str(&format!("{} Metadata\n\n", h));
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Rows Used:** {}\n", indicators.raw_data_count));
    if indicators.skipped_rows > 0 {
        section.push_str(&format!("- **Rows Skipped:** {}\n", indicators.skipped_rows));
    }
    let years: Vec<String> = indicators.years.iter().map(|y| y.to_string()).collect();
    section.push_str(&format!("- **Years:** {}\n", years.join(", ")));
    section.push_str(&format!(
        "- **Processing Time:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the headline figures shown as dashboard cards.
fn generate_key_figures_section(indicators: &Indicators, h: &str) -> String {
    let mut section = String::new();

    section.push_str(&format!("{} Key Figures\n\n", h));
    section.push_str("| Total Emissions (t CO2) | Average Consumption (MWh per company) ");
    section.push_str("| Companies | Sectors |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {:.2} | {:.2} | {} | {} |\n\n",
        indicators.total_emissions(),
        indicators.average_consumption.overall_average,
        indicators.company_count(),
        indicators.sector_count()
    ));

    section
}

/// Generate the emissions-by-year table.
fn generate_yearly_section(indicators: &Indicators, h: &str) -> String {
    let mut section = String::new();

    section.push_str(&format!("{} Emissions by Year\n\n", h));
    section.push_str("| Year | Emissions (t CO2) |\n");
    section.push_str("|:---|---:|\n");
    for entry in &indicators.total_emissions_by_year {
        section.push_str(&format!("| {} | {:.2} |\n", entry.year, entry.emissions));
    }
    section.push('\n');

    section
}

/// Generate the top emitters table.
fn generate_top_companies_section(indicators: &Indicators, h: &str) -> String {
    let mut section = String::new();

    section.push_str(&format!("{} Top Emitters\n\n", h));
    section.push_str("| # | Company | Emissions (t CO2) |\n");
    section.push_str("|:---:|:---|---:|\n");
    for (i, company) in indicators.top_companies.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {:.2} |\n",
            i + 1,
            escape_cell(&company.company),
            company.total_emissions
        ));
    }
    section.push('\n');

    section
}

/// Generate the per-company average consumption table.
fn generate_company_averages_section(indicators: &Indicators, h: &str) -> String {
    let mut section = String::new();

    section.push_str(&format!("{} Average Consumption by Company\n\n", h));
    section.push_str("| Company | Average (MWh) |\n");
    section.push_str("|:---|---:|\n");
    for company in &indicators.average_consumption.by_company {
        section.push_str(&format!(
            "| {} | {:.2} |\n",
            escape_cell(&company.company),
            company.average
        ));
    }
    section.push('\n');

    section
}

/// Generate the sector breakdown table.
fn generate_sector_section(indicators: &Indicators, h: &str) -> String {
    let mut section = String::new();

    section.push_str(&format!("{} Sector Analysis\n\n", h));
    section.push_str("| Sector | Emissions (t CO2) | Consumption (MWh) | Records |\n");
    section.push_str("|:---|---:|---:|:---:|\n");
    for sector in &indicators.sector_analysis {
        section.push_str(&format!(
            "| {} | {:.2} | {:.2} | {} |\n",
            escape_cell(&sector.sector),
            sector.total_emissions,
            sector.total_consumption,
            sector.companies
        ));
    }
    section.push('\n');

    section
}

/// Generate the skipped-row breakdown, if any rows were skipped.
fn generate_skipped_section(skipped: &SkipSummary, h: &str) -> String {
    let breakdown = skipped.breakdown();
    if breakdown.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str(&format!("{} Skipped Rows\n\n", h));
    section.push_str("| Reason | Rows |\n");
    section.push_str("|:---|:---:|\n");
    for (reason, count) in breakdown {
        section.push_str(&format!("| {} | {} |\n", reason, count));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by co2dash*\n".to_string()
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate a Markdown report covering several files.
pub fn generate_batch_markdown(entries: &[BatchEntry], options: &MarkdownOptions) -> String {
    let mut output = String::new();

    output.push_str("# Emissions & Energy Indicators\n\n");

    output.push_str("## Files\n\n");
    output.push_str("| File | Status | Rows Used | Rows Skipped | Total Emissions (t CO2) |\n");
    output.push_str("|:---|:---:|:---:|:---:|---:|\n");
    for entry in entries {
        match (&entry.report, &entry.error) {
            (Some(report), _) => output.push_str(&format!(
                "| `{}` | ok | {} | {} | {:.2} |\n",
                entry.source,
                report.indicators.raw_data_count,
                report.indicators.skipped_rows,
                report.indicators.total_emissions()
            )),
            (None, error) => output.push_str(&format!(
                "| `{}` | failed: {} | - | - | - |\n",
                entry.source,
                escape_cell(error.as_deref().unwrap_or("unknown error"))
            )),
        }
    }
    output.push('\n');

    for entry in entries {
        if let Some(ref report) = entry.report {
            output.push_str(&format!("## {}\n\n", entry.source));
            output.push_str(&generate_body(report, options, "###"));
        }
    }

    output.push_str(&generate_footer());
    output
}

/// Generate a JSON array covering several files.
pub fn generate_batch_json(entries: &[BatchEntry]) -> Result<String> {
    serde_json::to_string_pretty(entries).map_err(Into::into)
}
