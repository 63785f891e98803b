//! Decoded tabular data.
//!
//! A [`Dataset`] is the header row plus the raw cells of every data row,
//! exactly as the decoder saw them. Nothing is validated here.

pub mod decoder;

pub use decoder::{decode_file, DecodeOptions, SourceFormat};

/// A single raw cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Build a cell from decoded text, mapping blank strings to `Empty`.
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    /// Returns true when the cell holds no value.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) | Cell::Bool(_) => false,
        }
    }

    /// The cell as a label (company or sector name).
    pub fn as_label(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    /// The cell as a finite number. Numeric text is parsed after trimming.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::Bool(_) => return None,
        };

        value.is_finite().then_some(value)
    }
}

/// Render integral numbers without a trailing `.0`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Header row plus data rows of one decoded sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Create a dataset. Header names are trimmed.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let headers = headers.into_iter().map(|h| h.trim().to_string()).collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of data rows (header excluded).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of the first column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}
