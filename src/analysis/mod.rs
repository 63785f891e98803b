//! Indicator analysis.
//!
//! Validation turns raw cells into rows; the aggregator reduces those
//! rows into the indicator record. [`analyze`] runs both and applies the
//! minimum-data guards in between.

pub mod aggregator;
pub mod validation;

pub use aggregator::*;
pub use validation::{validate_dataset, YearRange};

use crate::dataset::Dataset;
use crate::error::IndicatorError;
use crate::models::{Indicators, SkipSummary};
use tracing::debug;

/// Tunables for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSettings {
    /// How many companies to list as top emitters.
    pub top_companies: usize,
    /// Fewer valid rows than this fails the run.
    pub min_valid_rows: usize,
    /// Accepted reporting years.
    pub years: YearRange,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            top_companies: 5,
            min_valid_rows: 3,
            years: YearRange::default(),
        }
    }
}

impl From<&crate::config::IndicatorsConfig> for AnalysisSettings {
    fn from(config: &crate::config::IndicatorsConfig) -> Self {
        Self {
            top_companies: config.top_companies,
            min_valid_rows: config.min_valid_rows,
            years: YearRange {
                min: config.min_year,
                max: config.max_year,
            },
        }
    }
}

/// Indicators together with the reasons rows were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub indicators: Indicators,
    pub skipped: SkipSummary,
}

/// Validate a dataset and compute every indicator.
pub fn analyze(
    dataset: &Dataset,
    settings: &AnalysisSettings,
) -> Result<Analysis, IndicatorError> {
    let validated = validate_dataset(dataset, settings.years)?;
    let rows = validated.rows;
    let skipped = validated.skipped;

    debug!(
        "Validated {} rows ({} accepted, {} skipped)",
        dataset.row_count(),
        rows.len(),
        skipped.total()
    );

    if rows.is_empty() {
        return Err(IndicatorError::EmptyDataset);
    }

    if rows.len() < settings.min_valid_rows {
        return Err(IndicatorError::InsufficientData {
            found: rows.len(),
            required: settings.min_valid_rows,
        });
    }

    let indicators = Indicators {
        total_emissions_by_year: emissions_by_year(&rows),
        average_consumption: average_consumption(&rows),
        top_companies: top_companies(&rows, settings.top_companies),
        sector_analysis: sector_analysis(&rows),
        raw_data_count: rows.len(),
        skipped_rows: skipped.total(),
        years: distinct_years(&rows),
    };

    Ok(Analysis {
        indicators,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::validation::REQUIRED_COLUMNS;
    use crate::dataset::Cell;

    fn compute(dataset: &Dataset, settings: &AnalysisSettings) -> Indicators {
        analyze(dataset, settings).unwrap().indicators
    }

    fn headers() -> Vec<String> {
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn record(
        company: &str,
        year: f64,
        sector: &str,
        consumption: f64,
        emissions: f64,
    ) -> Vec<Cell> {
        vec![
            Cell::from_text(company),
            Cell::Number(year),
            Cell::from_text(sector),
            Cell::Number(consumption),
            Cell::Number(emissions),
        ]
    }

    fn example_dataset() -> Dataset {
        Dataset::new(
            headers(),
            vec![
                record("A", 2020.0, "X", 100.0, 10.0),
                record("B", 2020.0, "X", 200.0, 20.0),
                record("A", 2021.0, "Y", 50.0, 5.0),
            ],
        )
    }

    #[test]
    fn test_worked_example() {
        let indicators = compute(&example_dataset(), &AnalysisSettings::default());

        let years: Vec<(i32, f64)> = indicators
            .total_emissions_by_year
            .iter()
            .map(|y| (y.year, y.emissions))
            .collect();
        assert_eq!(years, vec![(2020, 30.0), (2021, 5.0)]);

        assert_eq!(indicators.average_consumption.overall_average, 175.0);

        let top: Vec<(&str, f64)> = indicators
            .top_companies
            .iter()
            .map(|c| (c.company.as_str(), c.total_emissions))
            .collect();
        assert_eq!(top, vec![("B", 20.0), ("A", 15.0)]);

        assert_eq!(indicators.raw_data_count, 3);
        assert_eq!(indicators.skipped_rows, 0);
        assert_eq!(indicators.years, vec![2020, 2021]);
    }

    #[test]
    fn test_two_valid_rows_is_insufficient() {
        let dataset = Dataset::new(
            headers(),
            vec![
                record("A", 2020.0, "X", 1.0, 1.0),
                record("B", 2020.0, "X", 1.0, 1.0),
            ],
        );

        let err = analyze(&dataset, &AnalysisSettings::default()).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientData {
                found: 2,
                required: 3
            }
        );
    }

    #[test]
    fn test_no_valid_rows_is_empty_dataset() {
        let mut bad = record("A", 2020.0, "X", 1.0, 1.0);
        bad[1] = Cell::from_text("abc");
        let dataset = Dataset::new(headers(), vec![bad]);

        let err = analyze(&dataset, &AnalysisSettings::default()).unwrap_err();
        assert_eq!(err, IndicatorError::EmptyDataset);
    }

    #[test]
    fn test_missing_sector_column_is_schema_error() {
        let mut cols = headers();
        cols.retain(|c| c != "Setor");
        let dataset = Dataset::new(cols, vec![]);

        match analyze(&dataset, &AnalysisSettings::default()) {
            Err(IndicatorError::Schema { missing }) => assert_eq!(missing, vec!["Setor"]),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_year_is_skipped_not_aggregated() {
        let mut dataset_rows = example_dataset().rows().to_vec();
        let mut bad = record("Z", 2020.0, "X", 1000.0, 1000.0);
        bad[1] = Cell::from_text("abc");
        dataset_rows.push(bad);
        let dataset = Dataset::new(headers(), dataset_rows);

        let analysis = analyze(&dataset, &AnalysisSettings::default()).unwrap();

        assert_eq!(analysis.indicators.skipped_rows, 1);
        assert_eq!(analysis.skipped.invalid_year, 1);
        assert_eq!(analysis.indicators.raw_data_count, 3);
        assert!(analysis
            .indicators
            .top_companies
            .iter()
            .all(|c| c.company != "Z"));
        assert_eq!(analysis.indicators.total_emissions(), 35.0);
    }

    #[test]
    fn test_rerun_is_identical() {
        let dataset = example_dataset();
        let settings = AnalysisSettings::default();

        let first = analyze(&dataset, &settings).unwrap();
        let second = analyze(&dataset, &settings).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.indicators).unwrap(),
            serde_json::to_string(&second.indicators).unwrap()
        );
    }

    #[test]
    fn test_structural_properties() {
        let companies = [
            "Galp", "EDP", "Navigator", "Secil", "Cimpor", "REN", "Sonae",
        ];
        let mut rows = Vec::new();
        for (i, company) in companies.iter().enumerate() {
            for year in [2019.0, 2021.0, 2020.0] {
                let k = (i + 1) as f64;
                rows.push(record(company, year, "Industria", k * 10.3, k * year / 1000.0));
            }
        }
        let dataset = Dataset::new(headers(), rows);

        let indicators = compute(&dataset, &AnalysisSettings::default());

        let years: Vec<i32> = indicators
            .total_emissions_by_year
            .iter()
            .map(|y| y.year)
            .collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
        assert_eq!(years, indicators.years);

        let yearly_sum: f64 = indicators
            .total_emissions_by_year
            .iter()
            .map(|y| y.emissions)
            .sum();
        let row_sum: f64 = (1..=7)
            .flat_map(|k| [2019.0, 2021.0, 2020.0].map(|y: f64| k as f64 * y / 1000.0))
            .sum();
        assert!((yearly_sum - row_sum).abs() <= 0.01 * years.len() as f64);

        let by_company = &indicators.average_consumption.by_company;
        assert_eq!(by_company.len(), companies.len());
        assert!(by_company.windows(2).all(|w| w[0].average >= w[1].average));

        assert_eq!(indicators.top_companies.len(), 5);
        assert!(indicators
            .top_companies
            .windows(2)
            .all(|w| w[0].total_emissions >= w[1].total_emissions));
        assert_eq!(indicators.top_companies[0].company, "Sonae");

        assert_eq!(indicators.sector_analysis.len(), 1);
        assert_eq!(indicators.sector_analysis[0].companies, 21);
    }

    #[test]
    fn test_custom_settings() {
        let settings = AnalysisSettings {
            top_companies: 1,
            min_valid_rows: 1,
            years: YearRange::default(),
        };

        let indicators = compute(&example_dataset(), &settings);
        assert_eq!(indicators.top_companies.len(), 1);

        let dataset = Dataset::new(headers(), vec![record("A", 2020.0, "X", 1.0, 1.0)]);
        assert!(analyze(&dataset, &settings).is_ok());
    }
}
