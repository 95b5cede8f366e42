//! ## Custom Errors for Taxi ETL
//!
//! This module defines the error type shared by every pipeline stage.
//! It uses the `thiserror` crate to derive the `Error` trait.
//! The `EtlError` enum wraps the errors of the underlying libraries (I/O, DataFusion, Arrow,
//! Parquet, CSV, SQLite, HTTP) and adds the domain errors raised by the stages themselves.
//!
//! The `EtlResult` type alias simplifies error handling by providing a convenient
//! alias for results returned by the library.
//!
//! ### Example
//!
//! ```rust
//! use taxi_etl::exceptions::{EtlError, EtlResult};
//!
//! fn check_records(n: usize) -> EtlResult<usize> {
//!     if n == 0 {
//!         return Err(EtlError::InvalidParameter("record count must be positive".into()));
//!     }
//!     Ok(n)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Errors specific to the taxi ETL pipeline.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Wraps underlying I/O errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Wraps errors from DataFusion.
    #[error("DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    /// Wraps errors from Arrow.
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Wraps errors from Parquet.
    #[cfg(feature = "parquet")]
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Wraps errors from reading or writing delimited text.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Wraps errors from the SQLite driver.
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// Wraps errors from the HTTP client.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// An output directory could not be created. Always fatal.
    #[error("Cannot create directory '{}': {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Indicates that an invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Indicates that a required column does not exist in the input.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Parquet conversion was requested but the crate was built without it.
    #[error("Parquet conversion is not available in this build (enable the `parquet` feature)")]
    ConversionUnavailable,

    /// Chart rendering failed.
    #[error("Chart error: {0}")]
    ChartError(String),

    /// A pipeline stage finished with a non-zero exit code.
    #[error("Stage '{stage}' failed with exit code {code}")]
    StageFailed { stage: String, code: i32 },
}

impl EtlError {
    /// The process exit code a binary should terminate with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            EtlError::StageFailed { code, .. } => *code,
            _ => 1,
        }
    }
}

/// A convenient result type for taxi ETL operations.
pub type EtlResult<T> = std::result::Result<T, EtlError>;

/// Creates `path` and all of its parents, mapping failure to [`EtlError::CreateDirectory`].
pub fn ensure_dir(path: &std::path::Path) -> EtlResult<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|source| EtlError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

/// Creates the parent directory of a file path.
pub fn ensure_parent_dir(file: &std::path::Path) -> EtlResult<()> {
    match file.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}
