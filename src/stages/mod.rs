//! # Stage Implementations
//!
//! The submodules contain the work of each pipeline step. The [`Stage`] adapters below wrap them
//! for the orchestrator: they print the stage's `[INFO]` line and turn errors into a failed
//! [`StageResult`].

pub mod conversion;
pub mod dashboard;
pub mod ingestion;
pub mod loader;
pub mod processing;
pub mod synthetic;

use crate::pipeline::{Stage, StageResult};
use crate::status;
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;

use ingestion::{IngestOptions, IngestOutcome, Ingestion};

/// Downloads or synthesizes the raw dataset.
pub struct IngestStage {
    ingestion: Ingestion,
}

impl IngestStage {
    pub fn new(options: IngestOptions) -> Self {
        Self {
            ingestion: Ingestion::new(options),
        }
    }
}

#[async_trait]
impl Stage for IngestStage {
    async fn run(&self, out: &mut (dyn Write + Send)) -> StageResult {
        StageResult::from_outcome(self.ingestion.run(out).await, |outcome| match outcome {
            IngestOutcome::Downloaded { rows } => format!("downloaded {} rows", rows),
            IngestOutcome::Synthesized { records, reason } => {
                format!("synthesized {} records ({})", records, reason)
            }
        })
    }
}

/// Cleans and aggregates the raw dataset.
pub struct ProcessStage {
    pub input: PathBuf,
    pub output_dir: PathBuf,
}

#[async_trait]
impl Stage for ProcessStage {
    async fn run(&self, out: &mut (dyn Write + Send)) -> StageResult {
        let outcome = processing::process_trips(&self.input, &self.output_dir).await;
        if let Ok(report) = &outcome {
            status::info(
                out,
                format!(
                    "Cleaned {} of {} rows ({} dropped); wrote {} and {}",
                    report.cleaned_rows,
                    report.raw_rows,
                    report.dropped_rows(),
                    report.cleaned_path.display(),
                    report.summary_path.display()
                ),
            );
        }
        StageResult::from_outcome(outcome, |r| format!("{} cleaned rows", r.cleaned_rows))
    }
}

/// Loads the processed CSVs into SQLite.
pub struct LoadStage {
    pub trips: PathBuf,
    pub summary: PathBuf,
    pub database: PathBuf,
}

#[async_trait]
impl Stage for LoadStage {
    async fn run(&self, out: &mut (dyn Write + Send)) -> StageResult {
        let outcome = loader::load_database(&self.trips, &self.summary, &self.database);
        if let Ok(report) = &outcome {
            status::info(
                out,
                format!(
                    "Loaded {} trips and {} summary rows into {}",
                    report.trips,
                    report.summaries,
                    self.database.display()
                ),
            );
        }
        StageResult::from_outcome(outcome, |r| format!("{} trips loaded", r.trips))
    }
}

/// Renders the charts.
pub struct ChartStage {
    pub cleaned: PathBuf,
    pub summary: PathBuf,
    pub output_dir: PathBuf,
}

#[async_trait]
impl Stage for ChartStage {
    async fn run(&self, out: &mut (dyn Write + Send)) -> StageResult {
        let outcome = dashboard::build_charts(&self.cleaned, &self.summary, &self.output_dir);
        if outcome.is_ok() {
            status::info(out, format!("Saved charts to {}", self.output_dir.display()));
        }
        StageResult::from_outcome(outcome, |paths| format!("{} charts", paths.len()))
    }
}
