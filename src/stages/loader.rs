//! ## Load Stage
//!
//! Writes the processed CSVs into a SQLite database file. Both tables are replaced on every run
//! inside a single transaction, so a re-run leaves exactly the rows of the latest CSVs.

use crate::exceptions::{ensure_parent_dir, EtlResult};
use crate::schema::{read_rows, CleanedTrip, TripSummary};
use rusqlite::{params, Connection};
use std::path::Path;

pub const TRIPS_TABLE: &str = "trips";
pub const SUMMARY_TABLE: &str = "trip_summary";

const CREATE_TRIPS: &str = "CREATE TABLE trips (
    vendor_id INTEGER NOT NULL,
    tpep_pickup_datetime TEXT NOT NULL,
    tpep_dropoff_datetime TEXT NOT NULL,
    passenger_count INTEGER NOT NULL,
    trip_distance REAL NOT NULL,
    fare_amount REAL NOT NULL,
    total_amount REAL NOT NULL,
    payment_type INTEGER NOT NULL,
    pickup_date TEXT NOT NULL,
    trip_duration_minutes REAL NOT NULL
)";

const CREATE_SUMMARY: &str = "CREATE TABLE trip_summary (
    pickup_date TEXT NOT NULL,
    vendor_id INTEGER NOT NULL,
    trips_count INTEGER NOT NULL,
    avg_trip_distance REAL NOT NULL,
    avg_fare_amount REAL NOT NULL,
    total_revenue REAL NOT NULL,
    PRIMARY KEY (pickup_date, vendor_id)
)";

/// Row counts of a load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub trips: usize,
    pub summaries: usize,
}

/// Loads `trips_csv` and `summary_csv` into the database at `db_path`.
pub fn load_database(trips_csv: &Path, summary_csv: &Path, db_path: &Path) -> EtlResult<LoadReport> {
    let trips: Vec<CleanedTrip> = read_rows(trips_csv)?;
    let summaries: Vec<TripSummary> = read_rows(summary_csv)?;

    ensure_parent_dir(db_path)?;
    let mut conn = Connection::open(db_path)?;
    let report = write_tables(&mut conn, &trips, &summaries)?;
    tracing::debug!(
        trips = report.trips,
        summaries = report.summaries,
        db = %db_path.display(),
        "database loaded"
    );
    Ok(report)
}

/// Replaces both tables with the given rows.
pub fn write_tables(
    conn: &mut Connection,
    trips: &[CleanedTrip],
    summaries: &[TripSummary],
) -> EtlResult<LoadReport> {
    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {TRIPS_TABLE};
         DROP TABLE IF EXISTS {SUMMARY_TABLE};
         {CREATE_TRIPS};
         {CREATE_SUMMARY};
         CREATE INDEX idx_trips_pickup_date ON trips (pickup_date);"
    ))?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO trips (vendor_id, tpep_pickup_datetime, tpep_dropoff_datetime,
                passenger_count, trip_distance, fare_amount, total_amount, payment_type,
                pickup_date, trip_duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for t in trips {
            insert.execute(params![
                t.vendor_id,
                t.tpep_pickup_datetime,
                t.tpep_dropoff_datetime,
                t.passenger_count,
                t.trip_distance,
                t.fare_amount,
                t.total_amount,
                t.payment_type,
                t.pickup_date,
                t.trip_duration_minutes,
            ])?;
        }

        let mut insert = tx.prepare(
            "INSERT INTO trip_summary (pickup_date, vendor_id, trips_count,
                avg_trip_distance, avg_fare_amount, total_revenue)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for s in summaries {
            insert.execute(params![
                s.pickup_date,
                s.vendor_id,
                s.trips_count,
                s.avg_trip_distance,
                s.avg_fare_amount,
                s.total_revenue,
            ])?;
        }
    }
    tx.commit()?;
    Ok(LoadReport {
        trips: trips.len(),
        summaries: summaries.len(),
    })
}

/// Counts the rows of a table.
pub fn count_rows(conn: &Connection, table: &str) -> EtlResult<usize> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(n as usize)
}
