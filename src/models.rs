//! Data models for the indicator pipeline.
//!
//! This module contains the validated row type, the indicator record
//! consumed by the dashboard, and the report wrapper that carries run
//! metadata alongside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One validated observation from the source spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Company name.
    pub company: String,
    /// Reporting year.
    pub year: i32,
    /// Economic sector.
    pub sector: String,
    /// Energy consumption in MWh (non-negative).
    pub energy_consumption_mwh: f64,
    /// CO2 emissions in tonnes (non-negative).
    pub co2_emissions_tonnes: f64,
}

/// Total emissions for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyEmissions {
    pub year: i32,
    pub emissions: f64,
}

/// Average consumption of one company across its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAverage {
    pub company: String,
    pub average: f64,
}

/// Consumption averages, overall and per company.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageConsumption {
    /// Sum of per-company totals divided by the number of distinct companies.
    pub overall_average: f64,
    /// Per-company averages, highest first.
    pub by_company: Vec<CompanyAverage>,
}

/// Total emissions of one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyEmissions {
    pub company: String,
    pub total_emissions: f64,
}

/// Emission and consumption totals for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorSummary {
    pub sector: String,
    pub total_emissions: f64,
    pub total_consumption: f64,
    /// Number of rows in the sector. A company reported twice is counted twice.
    pub companies: usize,
}

/// The derived statistics returned for one dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicators {
    /// Emissions per year, ascending by year.
    pub total_emissions_by_year: Vec<YearlyEmissions>,
    /// Consumption averages.
    pub average_consumption: AverageConsumption,
    /// Largest emitters, highest first.
    pub top_companies: Vec<CompanyEmissions>,
    /// Sector breakdown, highest emissions first.
    pub sector_analysis: Vec<SectorSummary>,
    /// Number of rows accepted into the aggregates.
    pub raw_data_count: usize,
    /// Number of rows rejected by validation.
    pub skipped_rows: usize,
    /// Distinct years, ascending.
    pub years: Vec<i32>,
}

impl Indicators {
    /// Total emissions across all years, as shown on the dashboard.
    pub fn total_emissions(&self) -> f64 {
        let sum: f64 = self.total_emissions_by_year.iter().map(|y| y.emissions).sum();
        (sum * 100.0).round() / 100.0
    }

    /// Number of distinct companies among the valid rows.
    pub fn company_count(&self) -> usize {
        self.average_consumption.by_company.len()
    }

    /// Number of distinct sectors among the valid rows.
    pub fn sector_count(&self) -> usize {
        self.sector_analysis.len()
    }
}

/// Why a row was left out of the aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No non-empty cell under a named column.
    EmptyRow,
    /// Company or year is missing.
    MissingIdentity,
    /// Year is not an integer in the accepted range.
    InvalidYear,
    /// Consumption is not a non-negative number.
    InvalidConsumption,
    /// Emissions are not a non-negative number.
    InvalidEmissions,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyRow => write!(f, "Empty row"),
            SkipReason::MissingIdentity => write!(f, "Missing company or year"),
            SkipReason::InvalidYear => write!(f, "Invalid year"),
            SkipReason::InvalidConsumption => write!(f, "Invalid consumption"),
            SkipReason::InvalidEmissions => write!(f, "Invalid emissions"),
        }
    }
}

/// Per-reason counters of skipped rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipSummary {
    pub empty_rows: usize,
    pub missing_identity: usize,
    pub invalid_year: usize,
    pub invalid_consumption: usize,
    pub invalid_emissions: usize,
}

impl SkipSummary {
    /// Count one skipped row.
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::EmptyRow => self.empty_rows += 1,
            SkipReason::MissingIdentity => self.missing_identity += 1,
            SkipReason::InvalidYear => self.invalid_year += 1,
            SkipReason::InvalidConsumption => self.invalid_consumption += 1,
            SkipReason::InvalidEmissions => self.invalid_emissions += 1,
        }
    }

    /// Total number of skipped rows.
    pub fn total(&self) -> usize {
        self.empty_rows
            + self.missing_identity
            + self.invalid_year
            + self.invalid_consumption
            + self.invalid_emissions
    }

    /// Non-zero counters paired with their reason, in a fixed order.
    pub fn breakdown(&self) -> Vec<(SkipReason, usize)> {
        [
            (SkipReason::EmptyRow, self.empty_rows),
            (SkipReason::MissingIdentity, self.missing_identity),
            (SkipReason::InvalidYear, self.invalid_year),
            (SkipReason::InvalidConsumption, self.invalid_consumption),
            (SkipReason::InvalidEmissions, self.invalid_emissions),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect()
    }
}

/// Metadata about one indicator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Path or URL the data was read from.
    pub source: String,
    /// Detected source format.
    pub format: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Time spent decoding and aggregating, in seconds.
    pub duration_seconds: f64,
    /// Why rows were skipped.
    pub skipped: SkipSummary,
}

/// The complete indicator report.
///
/// Serializes with the indicator fields at the top level so dashboard
/// clients read the same keys whether or not they look at `metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the run.
    pub metadata: ReportMetadata,
    /// The computed indicators.
    #[serde(flatten)]
    pub indicators: Indicators,
}
