//! Spreadsheet decoding.
//!
//! Workbooks go through `calamine`, delimited text through `csv`. Both end
//! up as a [`Dataset`] whose first row is the header row.

use super::{Cell, Dataset};
use crate::error::IndicatorError;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::debug;

/// Source file format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Any workbook calamine can open (xlsx, xlsm, xls, ods).
    Workbook,
    /// Delimited text.
    Csv,
}

impl SourceFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xlsx" | "xlsm" | "xls" | "ods" => Some(SourceFormat::Workbook),
            "csv" => Some(SourceFormat::Csv),
            _ => None,
        }
    }

    /// Detect the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Options controlling how a source is decoded.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Worksheet to read; the first one when `None`.
    pub sheet: Option<String>,
    /// Field delimiter for CSV sources.
    pub csv_delimiter: u8,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            csv_delimiter: b',',
        }
    }
}

/// Decode a spreadsheet file into a dataset.
pub fn decode_file(path: &Path, options: &DecodeOptions) -> Result<Dataset, IndicatorError> {
    let format = SourceFormat::from_path(path).ok_or_else(|| {
        IndicatorError::Decode(format!("Unrecognised file type: {}", path.display()))
    })?;

    debug!("Decoding {} as {:?}", path.display(), format);

    let mut table = match format {
        SourceFormat::Workbook => read_workbook(path, options.sheet.as_deref())?,
        SourceFormat::Csv => read_csv(path, options.csv_delimiter)?,
    };

    if table.len() < 2 {
        return Err(IndicatorError::Decode(
            "File does not contain enough data (minimum 2 rows)".to_string(),
        ));
    }

    let header_cells = table.remove(0);
    let headers = header_cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell.as_label().unwrap_or_default();
            if i == 0 {
                name.trim_start_matches('\u{feff}').to_string()
            } else {
                name
            }
        })
        .collect();

    Ok(Dataset::new(headers, table))
}

/// Read one worksheet into rows of cells.
fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<Cell>>, IndicatorError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| IndicatorError::Decode(format!("Corrupt or invalid workbook: {}", e)))?;

    let range: Range<Data> = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .map_err(|e| IndicatorError::Decode(format!("Cannot read sheet '{}': {}", name, e)))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| IndicatorError::Decode("Workbook contains no worksheets".to_string()))?
            .map_err(|e| IndicatorError::Decode(format!("Cannot read first sheet: {}", e)))?,
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect())
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::from_text(&other.to_string()),
    }
}

/// Read a delimited text file into rows of cells, header included.
fn read_csv(path: &Path, delimiter: u8) -> Result<Vec<Vec<Cell>>, IndicatorError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| IndicatorError::Decode(format!("Cannot open CSV: {}", e)))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            IndicatorError::Decode(format!("Malformed CSV at line {}: {}", idx + 1, e))
        })?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(rows)
}
