//! Single-file pipeline: decode, analyze, wrap in a report.

use crate::analysis::{analyze, AnalysisSettings};
use crate::dataset::{decode_file, DecodeOptions, SourceFormat};
use crate::models::{Report, ReportMetadata};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Everything needed to turn one file into a report.
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub analysis: AnalysisSettings,
    pub decode: DecodeOptions,
}

/// Decode a spreadsheet and compute its indicator report.
///
/// `source` is the label recorded in the report metadata (the original
/// path or URL), which may differ from the on-disk `path`.
pub fn build_report(path: &Path, source: &str, settings: &PipelineSettings) -> Result<Report> {
    let start = Instant::now();

    let dataset = decode_file(path, &settings.decode)
        .with_context(|| format!("Failed to read {}", source))?;
    info!(
        "Decoded {} data rows and {} columns from {}",
        dataset.row_count(),
        dataset.headers().len(),
        source
    );

    let analysis = analyze(&dataset, &settings.analysis)
        .with_context(|| format!("Failed to compute indicators for {}", source))?;

    let format = match SourceFormat::from_path(path) {
        Some(SourceFormat::Csv) => "csv",
        _ => "workbook",
    };

    let metadata = ReportMetadata {
        source: source.to_string(),
        format: format.to_string(),
        generated_at: Utc::now(),
        duration_seconds: start.elapsed().as_secs_f64(),
        skipped: analysis.skipped,
    };

    info!(
        "Computed indicators for {}: {} rows used, {} skipped",
        source, analysis.indicators.raw_data_count, analysis.indicators.skipped_rows
    );

    Ok(Report {
        metadata,
        indicators: analysis.indicators,
    })
}

/// Result of a dry run: the file decodes and has every required column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCheck {
    pub data_rows: usize,
    pub columns: Vec<String>,
}

/// Decode a file and check its columns without aggregating.
pub fn check_schema(path: &Path, settings: &PipelineSettings) -> Result<SchemaCheck> {
    let dataset = decode_file(path, &settings.decode)?;
    crate::analysis::validation::ColumnMap::resolve(&dataset)?;

    Ok(SchemaCheck {
        data_rows: dataset.row_count(),
        columns: dataset.headers().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::validation::REQUIRED_COLUMNS;
    use crate::error::IndicatorError;
    use std::path::PathBuf;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/emissoes_amostra.csv")
    }

    #[test]
    fn test_build_report_from_fixture() {
        let report = build_report(&fixture(), "amostra", &PipelineSettings::default()).unwrap();
        let indicators = &report.indicators;

        assert_eq!(report.metadata.source, "amostra");
        assert_eq!(report.metadata.format, "csv");
        assert_eq!(indicators.raw_data_count, 12);
        assert_eq!(indicators.skipped_rows, 3);
        assert_eq!(report.metadata.skipped.total(), 3);
        assert_eq!(indicators.years, vec![2021, 2022, 2023]);
        assert_eq!(indicators.top_companies.len(), 5);
        assert_eq!(indicators.top_companies[0].company, "Galp Energia");
        assert_eq!(indicators.top_companies[0].total_emissions, 4350.75);
        assert_eq!(indicators.company_count(), 6);
        assert_eq!(indicators.sector_count(), 4);
    }

    #[test]
    fn test_xlsx_and_csv_agree() {
        let dir = tempfile::TempDir::new().unwrap();
        let csv_path = dir.path().join("dados.csv");
        let xlsx_path = dir.path().join("dados.xlsx");

        let rows = [
            ("A", 2020.0, "X", 100.0, 10.0),
            ("B", 2020.0, "X", 200.0, 20.0),
            ("A", 2021.0, "Y", 50.0, 5.5),
        ];

        let mut csv = String::from(
            "Empresa,Ano,Setor,Consumo de Energia (MWh),Emissões de CO2 (toneladas)\n",
        );
        for (company, year, sector, consumption, emissions) in rows {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                company, year, sector, consumption, emissions
            ));
        }
        std::fs::write(&csv_path, csv).unwrap();

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in REQUIRED_COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (i, (company, year, sector, consumption, emissions)) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet.write_string(r, 0, *company).unwrap();
            sheet.write_number(r, 1, *year).unwrap();
            sheet.write_string(r, 2, *sector).unwrap();
            sheet.write_number(r, 3, *consumption).unwrap();
            sheet.write_number(r, 4, *emissions).unwrap();
        }
        workbook.save(&xlsx_path).unwrap();

        let settings = PipelineSettings::default();
        let from_csv = build_report(&csv_path, "csv", &settings).unwrap();
        let from_xlsx = build_report(&xlsx_path, "xlsx", &settings).unwrap();

        assert_eq!(from_csv.indicators, from_xlsx.indicators);
        assert_eq!(from_xlsx.metadata.format, "workbook");
    }

    #[test]
    fn test_build_report_keeps_domain_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dados.csv");
        std::fs::write(&path, "Empresa,Ano\nA,2020\n").unwrap();

        let err = build_report(&path, "dados.csv", &PipelineSettings::default()).unwrap_err();
        let domain = err.downcast_ref::<IndicatorError>();
        assert!(matches!(domain, Some(IndicatorError::Schema { .. })));
    }

    #[test]
    fn test_check_schema() {
        let check = check_schema(&fixture(), &PipelineSettings::default()).unwrap();
        assert_eq!(check.data_rows, 15);
        assert!(check.columns.contains(&"Setor".to_string()));
    }
}
