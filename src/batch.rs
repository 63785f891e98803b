//! Directory mode: many spreadsheets, bounded concurrency.
//!
//! Each file runs through the single-file pipeline on the blocking pool.
//! A failing file is recorded and never stops the others.

use crate::models::Report;
use crate::pipeline::{build_report, PipelineSettings};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome for one file in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    /// File label (path relative to the scanned directory).
    pub source: String,
    /// The report, when the file was processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    /// The error message, when it was not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchEntry {
    pub fn is_success(&self) -> bool {
        self.report.is_some()
    }
}

/// One file to process: on-disk path and report label.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub path: PathBuf,
    pub label: String,
}

/// Process every input with at most `concurrency` files in flight.
///
/// Results come back in input order.
pub async fn run_batch(
    inputs: Vec<BatchInput>,
    settings: PipelineSettings,
    concurrency: usize,
    show_progress: bool,
) -> Vec<BatchEntry> {
    let settings = Arc::new(settings);

    let progress_bar = if show_progress {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let entries: Vec<BatchEntry> = stream::iter(inputs)
        .map(|input| {
            let settings = Arc::clone(&settings);
            let pb = progress_bar.clone();
            async move {
                let label = input.label.clone();
                debug!("Processing {}", label);

                let joined = tokio::task::spawn_blocking(move || {
                    build_report(&input.path, &input.label, &settings)
                })
                .await;

                if let Some(pb) = pb {
                    pb.set_message(label.clone());
                    pb.inc(1);
                }

                match joined {
                    Ok(Ok(report)) => BatchEntry {
                        source: label,
                        report: Some(report),
                        error: None,
                    },
                    Ok(Err(e)) => {
                        warn!("{}: {:#}", label, e);
                        BatchEntry {
                            source: label,
                            report: None,
                            error: Some(format!("{:#}", e)),
                        }
                    }
                    Err(e) => BatchEntry {
                        source: label,
                        report: None,
                        error: Some(format!("Worker failed: {}", e)),
                    },
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    entries
}
