//! # Taxi ETL
//!
//! A small, linear ETL pipeline for NYC taxi trip data:
//!
//! 1. **Ingest**: download a TLC Parquet file and convert it to CSV, or fall back to synthetic
//!    trips with the same schema ([`stages::ingestion`]).
//! 2. **Process**: clean the raw trips and aggregate a daily per-vendor summary with DataFusion
//!    ([`stages::processing`]).
//! 3. **Load**: write both processed files into SQLite ([`stages::loader`]).
//! 4. **Chart**: render static SVG charts ([`stages::dashboard`]).
//!
//! The [`pipeline::Pipeline`] runs the stages in order and aborts at the first failing one.
//!
//! ### Example
//!
//! ```rust,no_run
//! use taxi_etl::pipeline::Pipeline;
//! use taxi_etl::settings::PipelineSettings;
//!
//! # async fn demo() -> taxi_etl::exceptions::EtlResult<()> {
//! let settings = PipelineSettings::from_root("/tmp/taxi").with_num_records(1_000);
//! let mut stdout = std::io::stdout();
//! Pipeline::from_settings(&settings).run(&mut stdout).await?;
//! # Ok(())
//! # }
//! ```

pub mod exceptions;
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod settings;
pub mod stages;
pub mod status;
