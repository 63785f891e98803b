//! Schema checks and per-row validation.
//!
//! Invalid rows are never errors: they are dropped and counted in a
//! [`SkipSummary`]. Only a missing column stops the run at this stage.

use crate::dataset::{Cell, Dataset};
use crate::error::IndicatorError;
use crate::models::{Row, SkipReason, SkipSummary};
use tracing::debug;

pub const COLUMN_COMPANY: &str = "Empresa";
pub const COLUMN_YEAR: &str = "Ano";
pub const COLUMN_SECTOR: &str = "Setor";
pub const COLUMN_CONSUMPTION: &str = "Consumo de Energia (MWh)";
pub const COLUMN_EMISSIONS: &str = "Emissões de CO2 (toneladas)";

/// Required header names, in reporting order.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COLUMN_COMPANY,
    COLUMN_YEAR,
    COLUMN_SECTOR,
    COLUMN_CONSUMPTION,
    COLUMN_EMISSIONS,
];

/// Sector label used when a valid row has no sector.
pub const UNKNOWN_SECTOR: &str = "Unknown";

static EMPTY_CELL: Cell = Cell::Empty;

/// Accepted year range, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            min: 1900,
            max: 2100,
        }
    }
}

/// Column positions of the required fields.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    company: usize,
    year: usize,
    sector: usize,
    consumption: usize,
    emissions: usize,
}

impl ColumnMap {
    /// Resolve every required column, listing all that are missing.
    pub fn resolve(dataset: &Dataset) -> Result<Self, IndicatorError> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| dataset.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(IndicatorError::Schema { missing });
        }

        let index = |name: &str| dataset.column_index(name).unwrap_or_default();

        Ok(Self {
            company: index(COLUMN_COMPANY),
            year: index(COLUMN_YEAR),
            sector: index(COLUMN_SECTOR),
            consumption: index(COLUMN_CONSUMPTION),
            emissions: index(COLUMN_EMISSIONS),
        })
    }
}

/// Rows that passed validation plus the skip counters.
#[derive(Debug, Clone, Default)]
pub struct ValidatedRows {
    pub rows: Vec<Row>,
    pub skipped: SkipSummary,
}

/// Check the schema, then validate every data row in order.
pub fn validate_dataset(
    dataset: &Dataset,
    years: YearRange,
) -> Result<ValidatedRows, IndicatorError> {
    let columns = ColumnMap::resolve(dataset)?;
    let named: Vec<bool> = dataset.headers().iter().map(|h| !h.is_empty()).collect();

    let mut validated = ValidatedRows::default();

    for (idx, cells) in dataset.rows().iter().enumerate() {
        match validate_row(cells, &named, &columns, years) {
            Ok(row) => validated.rows.push(row),
            Err(reason) => {
                // +2: one for the header row, one for 1-based numbering
                debug!("Skipping row {}: {}", idx + 2, reason);
                validated.skipped.record(reason);
            }
        }
    }

    Ok(validated)
}

/// Validate one row of cells.
///
/// `named` flags which columns carry a header; cells under unnamed
/// columns do not make a row non-empty.
pub fn validate_row(
    cells: &[Cell],
    named: &[bool],
    columns: &ColumnMap,
    years: YearRange,
) -> Result<Row, SkipReason> {
    let has_value = cells
        .iter()
        .enumerate()
        .any(|(i, cell)| named.get(i).copied().unwrap_or(false) && !cell.is_blank());
    if !has_value {
        return Err(SkipReason::EmptyRow);
    }

    let cell = |i: usize| cells.get(i).unwrap_or(&EMPTY_CELL);

    let company = cell(columns.company).as_label();
    let year_cell = cell(columns.year);
    let company = match company {
        Some(company) if !year_cell.is_blank() => company,
        _ => return Err(SkipReason::MissingIdentity),
    };

    let year = year_cell
        .as_number()
        .filter(|y| y.fract() == 0.0 && *y >= years.min as f64 && *y <= years.max as f64)
        .ok_or(SkipReason::InvalidYear)? as i32;

    let energy_consumption_mwh =
        non_negative(cell(columns.consumption)).ok_or(SkipReason::InvalidConsumption)?;
    let co2_emissions_tonnes =
        non_negative(cell(columns.emissions)).ok_or(SkipReason::InvalidEmissions)?;

    let sector = cell(columns.sector)
        .as_label()
        .unwrap_or_else(|| UNKNOWN_SECTOR.to_string());

    Ok(Row {
        company,
        year,
        sector,
        energy_consumption_mwh,
        co2_emissions_tonnes,
    })
}

fn non_negative(cell: &Cell) -> Option<f64> {
    cell.as_number().filter(|v| *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn text(s: &str) -> Cell {
        Cell::from_text(s)
    }

    fn row(
        company: &str,
        year: &str,
        sector: &str,
        consumption: &str,
        emissions: &str,
    ) -> Vec<Cell> {
        vec![
            text(company),
            text(year),
            text(sector),
            text(consumption),
            text(emissions),
        ]
    }

    fn validate(rows: Vec<Vec<Cell>>) -> ValidatedRows {
        let dataset = Dataset::new(headers(), rows);
        validate_dataset(&dataset, YearRange::default()).unwrap()
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let dataset = Dataset::new(
            vec![
                "Empresa".to_string(),
                "Ano".to_string(),
                "Consumo de Energia (MWh)".to_string(),
            ],
            vec![],
        );

        let err = validate_dataset(&dataset, YearRange::default()).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::Schema {
                missing: vec![
                    "Setor".to_string(),
                    "Emissões de CO2 (toneladas)".to_string()
                ]
            }
        );
    }

    #[test]
    fn test_columns_may_appear_in_any_order() {
        let mut reordered = headers();
        reordered.reverse();
        let dataset = Dataset::new(
            reordered,
            vec![vec![text("7"), text("70"), text("X"), text("2020"), text("A")]],
        );

        let validated = validate_dataset(&dataset, YearRange::default()).unwrap();
        assert_eq!(validated.rows.len(), 1);
        assert_eq!(validated.rows[0].company, "A");
        assert_eq!(validated.rows[0].energy_consumption_mwh, 70.0);
        assert_eq!(validated.rows[0].co2_emissions_tonnes, 7.0);
    }

    #[test]
    fn test_valid_row_is_accepted() {
        let validated = validate(vec![row("EDP", "2020", "Energia", "100.5", "10")]);

        assert_eq!(validated.skipped.total(), 0);
        assert_eq!(
            validated.rows[0],
            Row {
                company: "EDP".to_string(),
                year: 2020,
                sector: "Energia".to_string(),
                energy_consumption_mwh: 100.5,
                co2_emissions_tonnes: 10.0,
            }
        );
    }

    #[test]
    fn test_skip_reasons() {
        let validated = validate(vec![
            row("", "", "", "", ""),
            row("", "2020", "X", "1", "1"),
            row("A", "", "X", "1", "1"),
            row("A", "abc", "X", "1", "1"),
            row("A", "1899", "X", "1", "1"),
            row("A", "2101", "X", "1", "1"),
            row("A", "2020.5", "X", "1", "1"),
            row("A", "2020", "X", "-1", "1"),
            row("A", "2020", "X", "", "1"),
            row("A", "2020", "X", "1", "n/a"),
        ]);

        assert!(validated.rows.is_empty());
        assert_eq!(validated.skipped.empty_rows, 1);
        assert_eq!(validated.skipped.missing_identity, 2);
        assert_eq!(validated.skipped.invalid_year, 4);
        assert_eq!(validated.skipped.invalid_consumption, 2);
        assert_eq!(validated.skipped.invalid_emissions, 1);
        assert_eq!(validated.skipped.total(), 10);
    }

    #[test]
    fn test_year_bounds_are_inclusive() {
        let validated = validate(vec![
            row("A", "1900", "X", "0", "0"),
            row("B", "2100", "X", "0", "0"),
        ]);

        assert_eq!(validated.rows.len(), 2);
        assert_eq!(validated.rows[0].year, 1900);
        assert_eq!(validated.rows[1].year, 2100);
    }

    #[test]
    fn test_custom_year_range() {
        let dataset = Dataset::new(headers(), vec![row("A", "1990", "X", "1", "1")]);
        let range = YearRange {
            min: 2000,
            max: 2030,
        };

        let validated = validate_dataset(&dataset, range).unwrap();
        assert_eq!(validated.skipped.invalid_year, 1);
    }

    #[test]
    fn test_missing_sector_is_grouped_as_unknown() {
        let validated = validate(vec![row("A", "2020", "", "1", "1")]);
        assert_eq!(validated.rows[0].sector, UNKNOWN_SECTOR);
    }

    #[test]
    fn test_cells_under_unnamed_columns_do_not_count() {
        let mut with_extra = headers();
        with_extra.push(String::new());
        let mut cells = row("", "", "", "", "");
        cells.push(text("stray note"));

        let dataset = Dataset::new(with_extra, vec![cells]);
        let validated = validate_dataset(&dataset, YearRange::default()).unwrap();

        assert_eq!(validated.skipped.empty_rows, 1);
    }

    #[test]
    fn test_short_rows_are_padded_with_empty_cells() {
        let validated = validate(vec![vec![text("A"), text("2020")]]);
        assert_eq!(validated.skipped.invalid_consumption, 1);
    }

    #[test]
    fn test_numeric_cells() {
        let validated = validate(vec![vec![
            text("A"),
            Cell::Number(2021.0),
            text("X"),
            Cell::Number(12.25),
            Cell::Number(0.0),
        ]]);

        assert_eq!(validated.rows[0].year, 2021);
        assert_eq!(validated.rows[0].energy_consumption_mwh, 12.25);
        assert_eq!(validated.rows[0].co2_emissions_tonnes, 0.0);
    }
}
