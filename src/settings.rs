//! ## Pipeline Settings
//!
//! File locations used by the orchestrator. All paths hang off a repository-root anchor:
//! `TAXI_ETL_ROOT` if set, otherwise the directory of this crate's manifest.

use crate::stages::ingestion::DEFAULT_NUM_RECORDS;
use std::path::{Path, PathBuf};

pub const ROOT_ENV: &str = "TAXI_ETL_ROOT";
pub const NUM_RECORDS_ENV: &str = "TAXI_ETL_NUM_RECORDS";

/// Fixed stage wiring under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub root: PathBuf,
    pub raw_csv: PathBuf,
    pub processed_dir: PathBuf,
    pub cleaned_csv: PathBuf,
    pub summary_csv: PathBuf,
    pub database: PathBuf,
    pub plots_dir: PathBuf,
    pub num_records: usize,
}

impl PipelineSettings {
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let processed_dir = root.join("data").join("processed");
        Self {
            raw_csv: root.join("data").join("raw").join("yellow_tripdata_2025-01.csv"),
            cleaned_csv: processed_dir.join(crate::stages::processing::CLEANED_FILE),
            summary_csv: processed_dir.join(crate::stages::processing::SUMMARY_FILE),
            database: root.join("database").join("taxi_trips.db"),
            plots_dir: root.join("reports").join("plots"),
            processed_dir,
            num_records: DEFAULT_NUM_RECORDS,
            root,
        }
    }

    /// Settings anchored at `TAXI_ETL_ROOT`, or the crate directory when unset.
    /// `TAXI_ETL_NUM_RECORDS` overrides the synthetic record count; unparsable values are ignored.
    pub fn from_env() -> Self {
        let settings = match std::env::var_os(ROOT_ENV) {
            Some(root) if !root.is_empty() => Self::from_root(PathBuf::from(root)),
            _ => Self::from_root(env!("CARGO_MANIFEST_DIR")),
        };
        match std::env::var(NUM_RECORDS_ENV).ok().and_then(|v| v.parse().ok()) {
            Some(n) => settings.with_num_records(n),
            None => settings,
        }
    }

    pub fn with_num_records(mut self, num_records: usize) -> Self {
        self.num_records = num_records;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_root() {
        let s = PipelineSettings::from_root("/srv/taxi");
        assert_eq!(
            s.raw_csv,
            PathBuf::from("/srv/taxi/data/raw/yellow_tripdata_2025-01.csv")
        );
        assert_eq!(
            s.cleaned_csv,
            PathBuf::from("/srv/taxi/data/processed/cleaned_trips.csv")
        );
        assert_eq!(
            s.summary_csv,
            PathBuf::from("/srv/taxi/data/processed/trip_summary.csv")
        );
        assert_eq!(s.database, PathBuf::from("/srv/taxi/database/taxi_trips.db"));
        assert_eq!(s.plots_dir, PathBuf::from("/srv/taxi/reports/plots"));
    }
}
