//! ## Processing Stage
//!
//! Cleans the raw dataset and aggregates it with DataFusion.
//!
//! Cleaning parses the timestamp columns and keeps only rows where:
//!
//! - every column is present and both timestamps parse,
//! - `dropoff > pickup`,
//! - `passenger_count`, `trip_distance` and `fare_amount` are positive,
//! - `total_amount >= fare_amount`.
//!
//! Two columns are derived: `pickup_date` and `trip_duration_minutes`.
//! The summary groups cleaned trips by `(pickup_date, vendor_id)` and reports the trip count,
//! average distance and fare (rounded to two decimals) and total revenue.

use crate::exceptions::{ensure_dir, EtlError, EtlResult};
use crate::schema::{
    raw_trip_schema, DROPOFF_DATETIME, FARE_AMOUNT, PASSENGER_COUNT, PAYMENT_TYPE,
    PICKUP_DATETIME, TOTAL_AMOUNT, TRIP_DISTANCE, VENDOR_ID,
};
use datafusion::arrow::datatypes::{DataType, TimeUnit};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::functions_aggregate::expr_fn::{avg, count, sum};
use datafusion::prelude::*;
use datafusion_expr::{cast, col, lit, try_cast, Expr};
use datafusion_functions::datetime::to_unixtime;
use datafusion_functions::math::round;
use std::fs::File;
use std::ops::{Div, Sub};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CLEANED_FILE: &str = "cleaned_trips.csv";
pub const SUMMARY_FILE: &str = "trip_summary.csv";
pub const PICKUP_DATE: &str = "pickup_date";
pub const TRIP_DURATION_MINUTES: &str = "trip_duration_minutes";

/// Row counts of a processing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingReport {
    pub raw_rows: usize,
    pub cleaned_rows: usize,
    pub summary_rows: usize,
    pub cleaned_path: PathBuf,
    pub summary_path: PathBuf,
}

impl ProcessingReport {
    pub fn dropped_rows(&self) -> usize {
        self.raw_rows.saturating_sub(self.cleaned_rows)
    }
}

/// Reads a raw dataset CSV into a DataFrame with the canonical schema.
pub async fn read_raw_trips(ctx: &SessionContext, path: &Path) -> EtlResult<DataFrame> {
    let path = path.to_str().ok_or_else(|| {
        EtlError::InvalidParameter(format!("Path '{}' is not valid UTF-8", path.display()))
    })?;
    let schema = raw_trip_schema();
    let options = CsvReadOptions::new().has_header(true).schema(&schema);
    Ok(ctx.read_csv(path, options).await?)
}

/// Applies the cleaning rules and adds the derived columns.
pub fn clean_trips(df: DataFrame) -> EtlResult<DataFrame> {
    // Unparsable timestamps become null and are dropped by the predicate below.
    let timestamp = DataType::Timestamp(TimeUnit::Nanosecond, None);
    let pickup = try_cast(col(PICKUP_DATETIME), timestamp.clone());
    let dropoff = try_cast(col(DROPOFF_DATETIME), timestamp);
    let parsed = df.select(vec![
        col(VENDOR_ID),
        pickup.alias(PICKUP_DATETIME),
        dropoff.alias(DROPOFF_DATETIME),
        col(PASSENGER_COUNT),
        col(TRIP_DISTANCE),
        col(FARE_AMOUNT),
        col(TOTAL_AMOUNT),
        col(PAYMENT_TYPE),
    ])?;

    let predicate = col(VENDOR_ID)
        .is_not_null()
        .and(col(PAYMENT_TYPE).is_not_null())
        .and(col(PICKUP_DATETIME).lt(col(DROPOFF_DATETIME)))
        .and(col(PASSENGER_COUNT).gt(lit(0i64)))
        .and(col(TRIP_DISTANCE).gt(lit(0.0)))
        .and(col(FARE_AMOUNT).gt(lit(0.0)))
        .and(col(TOTAL_AMOUNT).gt_eq(col(FARE_AMOUNT)));
    let filtered = parsed.filter(predicate)?;

    let duration_seconds = cast(
        to_unixtime()
            .call(vec![col(DROPOFF_DATETIME)])
            .sub(to_unixtime().call(vec![col(PICKUP_DATETIME)])),
        DataType::Float64,
    );
    let mut exprs: Vec<Expr> = filtered
        .schema()
        .fields()
        .iter()
        .map(|f| col(f.name()))
        .collect();
    exprs.push(cast(col(PICKUP_DATETIME), DataType::Date32).alias(PICKUP_DATE));
    exprs.push(
        round()
            .call(vec![duration_seconds.div(lit(60.0)), lit(2i64)])
            .alias(TRIP_DURATION_MINUTES),
    );
    Ok(filtered.select(exprs)?)
}

/// Aggregates cleaned trips per pickup date and vendor.
pub fn summarize_trips(cleaned: DataFrame) -> EtlResult<DataFrame> {
    let round2 = |name: &str| round().call(vec![col(name), lit(2i64)]).alias(name);
    let summary = cleaned
        .aggregate(
            vec![col(PICKUP_DATE), col(VENDOR_ID)],
            vec![
                count(lit(1)).alias("trips_count"),
                avg(col(TRIP_DISTANCE)).alias("avg_trip_distance"),
                avg(col(FARE_AMOUNT)).alias("avg_fare_amount"),
                sum(col(TOTAL_AMOUNT)).alias("total_revenue"),
            ],
        )?
        .select(vec![
            col(PICKUP_DATE),
            col(VENDOR_ID),
            col("trips_count"),
            round2("avg_trip_distance"),
            round2("avg_fare_amount"),
            round2("total_revenue"),
        ])?
        .sort(vec![
            col(PICKUP_DATE).sort(true, false),
            col(VENDOR_ID).sort(true, false),
        ])?;
    Ok(summary)
}

/// Collects `df` and writes it as CSV with a header, even when there are no rows.
/// Returns the number of rows written.
pub async fn write_csv(df: DataFrame, path: &Path) -> EtlResult<usize> {
    let schema = Arc::new(df.schema().as_arrow().clone());
    let batches = df.collect().await?;
    let file = File::create(path)?;
    let mut writer = datafusion::arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(file);
    let mut rows = 0usize;
    for batch in &batches {
        rows += batch.num_rows();
        writer.write(batch)?;
    }
    if batches.is_empty() {
        writer.write(&RecordBatch::new_empty(schema))?;
    }
    Ok(rows)
}

/// Runs the processing stage: reads `input`, writes the cleaned and summary CSVs into `output_dir`.
pub async fn process_trips(input: &Path, output_dir: &Path) -> EtlResult<ProcessingReport> {
    ensure_dir(output_dir)?;
    let ctx = SessionContext::new();
    let raw = read_raw_trips(&ctx, input).await?;
    let raw_rows = raw.clone().count().await?;

    let cleaned = clean_trips(raw)?;
    let cleaned_path = output_dir.join(CLEANED_FILE);
    let cleaned_rows = write_csv(cleaned.clone(), &cleaned_path).await?;

    let summary_path = output_dir.join(SUMMARY_FILE);
    let summary_rows = write_csv(summarize_trips(cleaned)?, &summary_path).await?;

    tracing::debug!(raw_rows, cleaned_rows, summary_rows, "processing finished");
    Ok(ProcessingReport {
        raw_rows,
        cleaned_rows,
        summary_rows,
        cleaned_path,
        summary_path,
    })
}
