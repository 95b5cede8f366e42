//! ## Ingestion Stage
//!
//! Produces the raw dataset CSV, either from a remote TLC Parquet file or from the synthetic
//! generator.
//!
//! The stage is a three-state machine: download, then convert, then (on any failure in the first
//! two, or when no source is given) synthesize. Network and conversion failures are recoverable:
//! they are reported as `[WARN]` lines and the stage falls back to synthetic data. The only fatal
//! error is failing to create the output directory (or a disk error while writing).
//!
//! The returned [`IngestOutcome`] records which path produced the file and, for synthetic data,
//! why the download path was not used.

use crate::exceptions::{ensure_parent_dir, EtlResult};
use crate::stages::conversion::{conversion_available, convert_parquet_to_csv};
use crate::stages::synthetic::SyntheticGenerator;
use crate::status;
use futures::StreamExt;
use std::fmt;
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const DEFAULT_OUTPUT: &str = "data/raw/yellow_tripdata_2025-01.csv";
pub const DEFAULT_NUM_RECORDS: usize = 100_000;
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Why the stage produced synthetic data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No source URL was given.
    NoSource,
    /// Synthetic data was requested explicitly.
    Forced,
    /// The download failed.
    DownloadFailed(String),
    /// The build cannot read Parquet files.
    ConversionUnavailable,
    /// The downloaded file could not be converted.
    ConversionFailed(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoSource => write!(f, "no source URL given"),
            FallbackReason::Forced => write!(f, "synthetic data requested"),
            FallbackReason::DownloadFailed(e) => write!(f, "download failed: {}", e),
            FallbackReason::ConversionUnavailable => write!(f, "parquet conversion unavailable"),
            FallbackReason::ConversionFailed(e) => write!(f, "conversion failed: {}", e),
        }
    }
}

/// How the raw dataset was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Downloaded { rows: usize },
    Synthesized { records: usize, reason: FallbackReason },
}

impl IngestOutcome {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, IngestOutcome::Synthesized { .. })
    }
}

/// Options of a single ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub url: Option<String>,
    pub output: PathBuf,
    pub generate_synthetic: bool,
    pub num_records: usize,
    pub seed: Option<u64>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            url: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            generate_synthetic: false,
            num_records: DEFAULT_NUM_RECORDS,
            seed: None,
        }
    }
}

/// The ingestion stage.
pub struct Ingestion {
    options: IngestOptions,
    can_convert: bool,
}

impl Ingestion {
    /// Creates the stage. The conversion capability is checked once, here.
    pub fn new(options: IngestOptions) -> Self {
        Self {
            options,
            can_convert: conversion_available(),
        }
    }

    /// Overrides the conversion capability.
    pub fn with_conversion(mut self, available: bool) -> Self {
        self.can_convert = available;
        self
    }

    /// Temporary download location: next to the output, named after it.
    pub fn temp_path(&self) -> PathBuf {
        let output = &self.options.output;
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        output.with_file_name(format!("{}.download.parquet", stem))
    }

    /// Runs the stage, writing status lines to `out`.
    pub async fn run(&self, out: &mut (dyn Write + Send)) -> EtlResult<IngestOutcome> {
        let output = &self.options.output;
        if self.options.generate_synthetic {
            return self.synthesize(out, FallbackReason::Forced);
        }
        let url = match self.options.url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => return self.synthesize(out, FallbackReason::NoSource),
        };

        ensure_parent_dir(output)?;
        let temp = self.temp_path();
        status::info(out, format!("Downloading Parquet data from {}…", url));
        let reason = match download_file(url, &temp).await {
            Err(e) => {
                status::warn(out, format!("Failed to download {}: {}", url, e));
                FallbackReason::DownloadFailed(e.to_string())
            }
            Ok(bytes) => {
                tracing::debug!(bytes, path = %temp.display(), "download finished");
                status::info(out, "Converting Parquet to CSV…");
                let converted = self.convert(out, &temp, output);
                let _ = std::fs::remove_file(&temp);
                match converted {
                    Ok(rows) => {
                        status::info(out, format!("Successfully saved CSV to {}", output.display()));
                        return Ok(IngestOutcome::Downloaded { rows });
                    }
                    Err(reason) => reason,
                }
            }
        };
        // A partial download may be left behind when the transfer broke off.
        let _ = std::fs::remove_file(&temp);
        status::warn(out, "Falling back to synthetic data generation.");
        self.synthesize(out, reason)
    }

    fn convert(
        &self,
        out: &mut (dyn Write + Send),
        parquet_path: &Path,
        csv_path: &Path,
    ) -> Result<usize, FallbackReason> {
        if !self.can_convert {
            status::warn(
                out,
                "Parquet support is not available in this build; cannot convert Parquet to CSV.",
            );
            return Err(FallbackReason::ConversionUnavailable);
        }
        convert_parquet_to_csv(parquet_path, csv_path).map_err(|e| {
            status::warn(
                out,
                format!("Failed to convert {} to CSV: {}", parquet_path.display(), e),
            );
            FallbackReason::ConversionFailed(e.to_string())
        })
    }

    fn synthesize(
        &self,
        out: &mut (dyn Write + Send),
        reason: FallbackReason,
    ) -> EtlResult<IngestOutcome> {
        let output = &self.options.output;
        let records = match self.options.seed {
            Some(seed) => SyntheticGenerator::seeded(seed),
            None => SyntheticGenerator::from_entropy(),
        }
        .write_csv(output, self.options.num_records)?;
        status::info(
            out,
            format!(
                "Generated synthetic dataset with {} records at {}",
                records,
                output.display()
            ),
        );
        Ok(IngestOutcome::Synthesized { records, reason })
    }
}

/// True for URLs on this machine; these never go through a proxy.
fn is_loopback(url: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(url) else {
        return false;
    };
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_matches(|c| c == '[' || c == ']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}

/// Streams `url` into `dest`. Returns the number of bytes written.
pub async fn download_file(url: &str, dest: &Path) -> EtlResult<u64> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if is_loopback(url) {
        builder = builder.no_proxy();
    }
    let client = builder.build()?;
    let response = client.get(url).send().await?.error_for_status()?;
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
