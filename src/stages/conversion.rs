//! ## Parquet to CSV Conversion
//!
//! Rewrites a downloaded TLC Parquet file as a raw dataset CSV. The Parquet columns are projected
//! onto the canonical trip schema: names are matched case-insensitively (TLC files spell the
//! vendor column `VendorID`), integer columns are cast to `Int64` and amounts to `Float64`, and
//! every other column is dropped.
//!
//! Conversion is an optional capability gated by the `parquet` cargo feature. Callers check
//! [`conversion_available`] instead of probing for the dependency at runtime.

use crate::exceptions::{EtlError, EtlResult};
use crate::schema::{
    DROPOFF_DATETIME, FARE_AMOUNT, PASSENGER_COUNT, PAYMENT_TYPE, PICKUP_DATETIME,
    TOTAL_AMOUNT, TRIP_DISTANCE, VENDOR_ID,
};
use arrow::datatypes::DataType;
use std::path::Path;

/// Returns true if this build can convert Parquet files.
pub fn conversion_available() -> bool {
    cfg!(feature = "parquet")
}

/// Source column aliases for each canonical column, and the type the column is cast to.
/// `None` keeps the source type (timestamps).
#[cfg_attr(not(feature = "parquet"), allow(dead_code))]
pub(crate) fn column_plan() -> [(&'static str, &'static [&'static str], Option<DataType>); 8] {
    [
        (VENDOR_ID, &["vendor_id", "vendorid"], Some(DataType::Int64)),
        (PICKUP_DATETIME, &["tpep_pickup_datetime"], None),
        (DROPOFF_DATETIME, &["tpep_dropoff_datetime"], None),
        (PASSENGER_COUNT, &["passenger_count"], Some(DataType::Int64)),
        (TRIP_DISTANCE, &["trip_distance"], Some(DataType::Float64)),
        (FARE_AMOUNT, &["fare_amount"], Some(DataType::Float64)),
        (TOTAL_AMOUNT, &["total_amount"], Some(DataType::Float64)),
        (PAYMENT_TYPE, &["payment_type"], Some(DataType::Int64)),
    ]
}

/// Finds the index of the first column whose lowercased name is one of `aliases`.
#[cfg_attr(not(feature = "parquet"), allow(dead_code))]
fn find_column(schema: &arrow::datatypes::Schema, aliases: &[&str]) -> Option<usize> {
    schema
        .fields()
        .iter()
        .position(|f| aliases.contains(&f.name().to_lowercase().as_str()))
}

/// Converts the Parquet file at `parquet_path` into a CSV file at `csv_path`.
/// Returns the number of rows written.
#[cfg(feature = "parquet")]
pub fn convert_parquet_to_csv(parquet_path: &Path, csv_path: &Path) -> EtlResult<usize> {
    use arrow::compute::cast;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::fs::File;
    use std::sync::Arc;

    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(parquet_path)?)?;
    let source_schema = builder.schema().clone();

    // Resolve the projection before touching the output file.
    let mut indices = Vec::with_capacity(8);
    let mut fields = Vec::with_capacity(8);
    for (name, aliases, target) in column_plan() {
        let idx = find_column(&source_schema, aliases).ok_or_else(|| {
            EtlError::MissingColumn(format!("Column '{}' not found in {}", name, parquet_path.display()))
        })?;
        let source_type = source_schema.field(idx).data_type().clone();
        indices.push((idx, target.clone()));
        fields.push(Field::new(name, target.unwrap_or(source_type), true));
    }
    let schema = Arc::new(Schema::new(fields));

    let reader = builder.build()?;
    let file = File::create(csv_path)?;
    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(file);

    let mut rows = 0usize;
    let mut wrote_any = false;
    for batch in reader {
        let batch = batch?;
        let mut columns = Vec::with_capacity(indices.len());
        for (idx, target) in &indices {
            let column = batch.column(*idx);
            columns.push(match target {
                Some(dt) => cast(column, dt)?,
                None => column.clone(),
            });
        }
        let projected = RecordBatch::try_new(schema.clone(), columns)?;
        rows += projected.num_rows();
        writer.write(&projected)?;
        wrote_any = true;
    }
    if !wrote_any {
        writer.write(&RecordBatch::new_empty(schema))?;
    }
    tracing::debug!(rows, path = %csv_path.display(), "converted parquet to csv");
    Ok(rows)
}

/// Without the `parquet` feature conversion always fails with [`EtlError::ConversionUnavailable`].
#[cfg(not(feature = "parquet"))]
pub fn convert_parquet_to_csv(_parquet_path: &Path, _csv_path: &Path) -> EtlResult<usize> {
    Err(EtlError::ConversionUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};

    #[test]
    fn vendor_column_matches_tlc_spelling() {
        let schema = Schema::new(vec![
            Field::new("VendorID", DataType::Int32, true),
            Field::new("trip_distance", DataType::Float64, true),
        ]);
        let plan = column_plan();
        assert_eq!(find_column(&schema, plan[0].1), Some(0));
        assert_eq!(find_column(&schema, plan[4].1), Some(1));
        assert_eq!(find_column(&schema, plan[5].1), None);
    }

    #[test]
    fn capability_follows_feature() {
        assert_eq!(conversion_available(), cfg!(feature = "parquet"));
    }
}
