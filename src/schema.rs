//! ## Trip Schema
//!
//! Row types shared by the stages and the canonical column layout of the raw dataset.
//!
//! - [`TripRecord`]: one raw taxi ride, as written by ingestion.
//! - [`CleanedTrip`]: a validated ride with derived columns, as written by processing.
//! - [`TripSummary`]: one (date, vendor) aggregate row.
//!
//! Field names are the CSV header names, so `csv` + `serde` read and write these files directly.

use arrow::datatypes::{DataType, Field, Schema};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const VENDOR_ID: &str = "vendor_id";
pub const PICKUP_DATETIME: &str = "tpep_pickup_datetime";
pub const DROPOFF_DATETIME: &str = "tpep_dropoff_datetime";
pub const PASSENGER_COUNT: &str = "passenger_count";
pub const TRIP_DISTANCE: &str = "trip_distance";
pub const FARE_AMOUNT: &str = "fare_amount";
pub const TOTAL_AMOUNT: &str = "total_amount";
pub const PAYMENT_TYPE: &str = "payment_type";

/// Column order of the raw dataset.
pub const TRIP_COLUMNS: [&str; 8] = [
    VENDOR_ID,
    PICKUP_DATETIME,
    DROPOFF_DATETIME,
    PASSENGER_COUNT,
    TRIP_DISTANCE,
    FARE_AMOUNT,
    TOTAL_AMOUNT,
    PAYMENT_TYPE,
];

/// The exact header line of a raw dataset file.
pub const TRIP_HEADER: &str = "vendor_id,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,trip_distance,fare_amount,total_amount,payment_type";

pub const VENDOR_IDS: [i64; 2] = [1, 2];
pub const PAYMENT_TYPES: [i64; 5] = [1, 2, 3, 4, 5];

/// One taxi ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub vendor_id: i64,
    pub tpep_pickup_datetime: NaiveDateTime,
    pub tpep_dropoff_datetime: NaiveDateTime,
    pub passenger_count: i64,
    pub trip_distance: f64,
    pub fare_amount: f64,
    pub total_amount: f64,
    pub payment_type: i64,
}

impl TripRecord {
    /// Checks the record-level invariants: dropoff not before pickup, total covers the fare.
    pub fn is_consistent(&self) -> bool {
        self.tpep_dropoff_datetime >= self.tpep_pickup_datetime
            && self.total_amount >= self.fare_amount
    }
}

/// A ride that passed cleaning, with derived columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedTrip {
    pub vendor_id: i64,
    pub tpep_pickup_datetime: String,
    pub tpep_dropoff_datetime: String,
    pub passenger_count: i64,
    pub trip_distance: f64,
    pub fare_amount: f64,
    pub total_amount: f64,
    pub payment_type: i64,
    pub pickup_date: String,
    pub trip_duration_minutes: f64,
}

/// Daily per-vendor aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub pickup_date: String,
    pub vendor_id: i64,
    pub trips_count: i64,
    pub avg_trip_distance: f64,
    pub avg_fare_amount: f64,
    pub total_revenue: f64,
}

/// Arrow schema used to read the raw dataset. Timestamps are read as text and parsed later.
pub fn raw_trip_schema() -> Schema {
    Schema::new(vec![
        Field::new(VENDOR_ID, DataType::Int64, true),
        Field::new(PICKUP_DATETIME, DataType::Utf8, true),
        Field::new(DROPOFF_DATETIME, DataType::Utf8, true),
        Field::new(PASSENGER_COUNT, DataType::Int64, true),
        Field::new(TRIP_DISTANCE, DataType::Float64, true),
        Field::new(FARE_AMOUNT, DataType::Float64, true),
        Field::new(TOTAL_AMOUNT, DataType::Float64, true),
        Field::new(PAYMENT_TYPE, DataType::Int64, true),
    ])
}

/// Reads every row of a CSV file into `T`.
pub fn read_rows<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
) -> crate::exceptions::EtlResult<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_matches_column_order() {
        assert_eq!(TRIP_COLUMNS.join(","), TRIP_HEADER);
        let names: Vec<String> = raw_trip_schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names.join(","), TRIP_HEADER);
    }

    #[test]
    fn serialized_header_matches() {
        let mut writer = csv::Writer::from_writer(vec![]);
        let pickup = NaiveDateTime::parse_from_str("2025-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        writer
            .serialize(TripRecord {
                vendor_id: 1,
                tpep_pickup_datetime: pickup,
                tpep_dropoff_datetime: pickup + chrono::Duration::minutes(10),
                passenger_count: 1,
                trip_distance: 1.5,
                fare_amount: 6.25,
                total_amount: 7.5,
                payment_type: 2,
            })
            .unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(TRIP_HEADER));
        assert_eq!(
            lines.next(),
            Some("1,2025-01-01T00:00:00,2025-01-01T00:10:00,1,1.5,6.25,7.5,2")
        );
    }
}
