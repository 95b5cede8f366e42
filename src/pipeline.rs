//! ## Taxi ETL Pipeline
//!
//! This module provides the orchestration layer of the pipeline.
//!
//! ### Overview
//!
//! - The [`Stage`] trait is the common interface of a pipeline step. A stage runs to completion
//!   and reports a [`StageResult`] (pass/fail plus an exit code) instead of raising.
//! - The [`Pipeline`] struct runs named stages in order and stops at the first failing one,
//!   surfacing it as [`EtlError::StageFailed`]. Later stages are never started.
//! - [`CommandStage`] runs an external program as a stage, so any step can stay an
//!   independently invocable binary.
//! - The [`crate::make_pipeline`] macro boxes stages and builds a pipeline in one go.

use crate::exceptions::{EtlError, EtlResult};
use crate::settings::PipelineSettings;
use crate::stages::ingestion::IngestOptions;
use crate::stages::{ChartStage, IngestStage, LoadStage, ProcessStage};
use crate::status::{self, StatusLevel};
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::Write;
use std::time::Instant;

/// Pass/fail status of a stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Passed,
    Failed,
}

/// The outcome of running one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub status: StageStatus,
    pub exit_code: i32,
    pub message: String,
}

impl StageResult {
    pub fn passed(message: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Passed,
            exit_code: 0,
            message: message.into(),
        }
    }

    pub fn failed(exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Failed,
            exit_code,
            message: message.into(),
        }
    }

    /// Maps an exit code to a result; zero passes, anything else fails.
    pub fn from_exit_code(exit_code: i32, message: impl Into<String>) -> Self {
        if exit_code == 0 {
            Self::passed(message)
        } else {
            Self::failed(exit_code, message)
        }
    }

    /// Converts a stage's `EtlResult` into a result, using the error's exit code on failure.
    pub fn from_outcome<T>(outcome: EtlResult<T>, describe: impl FnOnce(&T) -> String) -> Self {
        match outcome {
            Ok(value) => Self::passed(describe(&value)),
            Err(e) => Self::failed(e.exit_code(), e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StageStatus::Passed && self.exit_code == 0
    }
}

/// Trait for the steps of the pipeline.
///
/// A stage owns its input and output paths. It writes its own status lines to `out` and reports
/// failure through the returned [`StageResult`].
#[async_trait]
pub trait Stage {
    /// Run the stage to completion.
    ///
    /// # Arguments
    ///
    /// * `out` - Destination of the stage's status lines.
    ///
    /// # Returns
    ///
    /// * `StageResult` - Passed with exit code 0, or failed with a non-zero exit code.
    async fn run(&self, out: &mut (dyn Write + Send)) -> StageResult;
}

/// Runs an external program as a stage. The program's exit status becomes the stage result.
pub struct CommandStage {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandStage {
    pub fn new<I, S>(program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Stage for CommandStage {
    async fn run(&self, _out: &mut (dyn Write + Send)) -> StageResult {
        let program = self.program.to_string_lossy().into_owned();
        match tokio::process::Command::new(&self.program)
            .args(&self.args)
            .status()
            .await
        {
            // A signal-terminated child has no code; report it as a generic failure.
            Ok(status) => StageResult::from_exit_code(
                status.code().unwrap_or(1),
                format!("{} exited with {}", program, status),
            ),
            Err(e) => StageResult::failed(127, format!("Cannot start {}: {}", program, e)),
        }
    }
}

/// Summary of a completed pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub stages: Vec<(String, StageResult)>,
}

/// A pipeline that runs a sequence of stages.
///
/// Each stage is named by its description (e.g. `"Processing data"`), which is also what a
/// failure reports.
pub struct Pipeline {
    steps: Vec<(String, Box<dyn Stage + Send + Sync>)>,
    verbose: bool,
}

impl Pipeline {
    /// Creates a new pipeline.
    ///
    /// # Arguments
    ///
    /// * `steps` - A vector of (description, stage) pairs (each stage is already boxed).
    /// * `verbose` - If true, prints timing information after each stage.
    pub fn new(steps: Vec<(String, Box<dyn Stage + Send + Sync>)>, verbose: bool) -> Self {
        Self { steps, verbose }
    }

    /// The standard four-stage pipeline: ingest, process, load, chart.
    ///
    /// Ingestion gets no source URL, so it writes synthetic data.
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        crate::make_pipeline!(
            false,
            (
                "Ingesting data",
                IngestStage::new(IngestOptions {
                    output: settings.raw_csv.clone(),
                    num_records: settings.num_records,
                    ..Default::default()
                })
            ),
            (
                "Processing data",
                ProcessStage {
                    input: settings.raw_csv.clone(),
                    output_dir: settings.processed_dir.clone(),
                }
            ),
            (
                "Loading data into SQLite",
                LoadStage {
                    trips: settings.cleaned_csv.clone(),
                    summary: settings.summary_csv.clone(),
                    database: settings.database.clone(),
                }
            ),
            (
                "Generating charts",
                ChartStage {
                    cleaned: settings.cleaned_csv.clone(),
                    summary: settings.summary_csv.clone(),
                    output_dir: settings.plots_dir.clone(),
                }
            ),
        )
    }

    /// Stage descriptions, in execution order.
    pub fn descriptions(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Runs every stage in order, stopping at the first failure.
    ///
    /// Prints `[PIPELINE] <description>…` before each stage and a completion line at the end.
    /// A failing stage prints its failure message as a `[WARN]` line and yields
    /// `EtlError::StageFailed` carrying its description and exit code.
    pub async fn run(&self, out: &mut (dyn Write + Send)) -> EtlResult<PipelineReport> {
        if self.steps.is_empty() {
            return Err(EtlError::InvalidParameter(
                "Pipeline must have at least one stage.".to_string(),
            ));
        }
        let mut stages = Vec::with_capacity(self.steps.len());
        for (name, stage) in self.steps.iter() {
            status::emit(out, StatusLevel::Pipeline, format!("{}…", name));
            let start = Instant::now();
            let result = stage.run(out).await;
            tracing::debug!(
                stage = name.as_str(),
                exit_code = result.exit_code,
                detail = result.message.as_str(),
                elapsed = ?start.elapsed(),
                "stage finished"
            );
            if !result.is_success() {
                // Any non-zero code aborts; a failure reported with code 0 still counts as 1.
                let code = if result.exit_code == 0 { 1 } else { result.exit_code };
                tracing::warn!(stage = name.as_str(), detail = result.message.as_str(), "stage failed");
                status::warn(out, format!("{} failed: {}", name, result.message));
                return Err(EtlError::StageFailed {
                    stage: name.clone(),
                    code,
                });
            }
            if self.verbose {
                let _ = writeln!(out, "Stage '{}' completed in {:?}", name, start.elapsed());
            }
            stages.push((name.clone(), result));
        }
        status::emit(out, StatusLevel::Pipeline, "Pipeline completed successfully.");
        Ok(PipelineReport { stages })
    }
}

/// Macro to simplify pipeline creation by automatically boxing stages.
///
/// # Example
///
/// ```rust,no_run
/// use taxi_etl::make_pipeline;
/// use taxi_etl::pipeline::CommandStage;
///
/// let pipeline = make_pipeline!(false,
///     ("Listing files", CommandStage::new("ls", ["-l"])),
/// );
/// ```
#[macro_export]
macro_rules! make_pipeline {
    ($verbose:expr, $(($name:expr, $stage:expr)),+ $(,)?) => {
        {
            let steps: Vec<(String, Box<dyn $crate::pipeline::Stage + Send + Sync>)> = vec![
                $(
                    ($name.to_string(), Box::new($stage)),
                )+
            ];
            $crate::pipeline::Pipeline::new(steps, $verbose)
        }
    };
}
