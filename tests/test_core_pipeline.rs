use async_trait::async_trait;
use std::io::Write;
use std::sync::{Arc, Mutex};
use taxi_etl::exceptions::{EtlError, EtlResult};
use taxi_etl::make_pipeline;
use taxi_etl::pipeline::{CommandStage, Pipeline, Stage, StageResult};
use taxi_etl::settings::PipelineSettings;
use taxi_etl::stages::loader::{count_rows, TRIPS_TABLE};

mod shared;

/// A stage that records that it ran and exits with a fixed code.
struct RecordingStage {
    name: &'static str,
    exit_code: i32,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Stage for RecordingStage {
    async fn run(&self, _out: &mut (dyn Write + Send)) -> StageResult {
        self.log.lock().unwrap().push(self.name);
        StageResult::from_exit_code(self.exit_code, self.name)
    }
}

fn recording_pipeline(codes: [i32; 4], log: &Arc<Mutex<Vec<&'static str>>>) -> Pipeline {
    let stage = |name, exit_code| RecordingStage {
        name,
        exit_code,
        log: Arc::clone(log),
    };
    make_pipeline!(
        false,
        ("Ingesting data", stage("ingest", codes[0])),
        ("Processing data", stage("process", codes[1])),
        ("Loading data into SQLite", stage("load", codes[2])),
        ("Generating charts", stage("charts", codes[3])),
    )
}

#[tokio::test]
async fn test_all_stages_run_in_order() -> EtlResult<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = recording_pipeline([0, 0, 0, 0], &log);
    let mut out = Vec::new();
    let report = pipeline.run(&mut out).await?;

    assert_eq!(*log.lock().unwrap(), vec!["ingest", "process", "load", "charts"]);
    assert_eq!(report.stages.len(), 4);
    assert_eq!(
        shared::captured(&out),
        vec![
            "[PIPELINE] Ingesting data…",
            "[PIPELINE] Processing data…",
            "[PIPELINE] Loading data into SQLite…",
            "[PIPELINE] Generating charts…",
            "[PIPELINE] Pipeline completed successfully.",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_failure_aborts_remaining_stages() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = recording_pipeline([0, 3, 0, 0], &log);
    let mut out = Vec::new();
    let err = pipeline.run(&mut out).await.unwrap_err();

    match &err {
        EtlError::StageFailed { stage, code } => {
            assert_eq!(stage, "Processing data");
            assert_eq!(*code, 3);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err.exit_code(), 3);
    assert_eq!(err.to_string(), "Stage 'Processing data' failed with exit code 3");
    // Stages 3 and 4 never started.
    assert_eq!(*log.lock().unwrap(), vec!["ingest", "process"]);
    let status = shared::captured(&out);
    assert_eq!(
        &status[status.len() - 2..],
        &["[PIPELINE] Processing data…", "[WARN] Processing data failed: process"]
    );
    assert!(!status.iter().any(|l| l.contains("completed")));
}

#[tokio::test]
async fn test_first_stage_failure_runs_nothing_else() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let err = recording_pipeline([1, 0, 0, 0], &log)
        .run(&mut Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert_eq!(*log.lock().unwrap(), vec!["ingest"]);
}

#[tokio::test]
async fn test_verbose_pipeline_reports_stage_timing() -> EtlResult<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = make_pipeline!(
        true,
        (
            "Ingesting data",
            RecordingStage {
                name: "ingest",
                exit_code: 0,
                log: Arc::clone(&log),
            }
        ),
    );
    let mut out = Vec::new();
    pipeline.run(&mut out).await?;
    let status = shared::captured(&out);
    assert_eq!(status.len(), 3);
    assert!(status[1].starts_with("Stage 'Ingesting data' completed in"), "{}", status[1]);
    Ok(())
}

#[tokio::test]
async fn test_empty_pipeline_is_rejected() {
    let pipeline = Pipeline::new(vec![], false);
    let err = pipeline.run(&mut Vec::new()).await.unwrap_err();
    assert!(matches!(err, EtlError::InvalidParameter(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_stage_exit_code_is_propagated() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = make_pipeline!(
        false,
        ("Succeeding command", CommandStage::new("sh", ["-c", "exit 0"])),
        ("Failing command", CommandStage::new("sh", ["-c", "exit 4"])),
        (
            "Never started",
            RecordingStage {
                name: "after",
                exit_code: 0,
                log: Arc::clone(&log),
            }
        ),
    );
    let err = pipeline.run(&mut Vec::new()).await.unwrap_err();
    assert!(matches!(
        err,
        EtlError::StageFailed { ref stage, code: 4 } if stage == "Failing command"
    ));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_command_stage_that_cannot_start_fails() {
    let stage = CommandStage::new("/nonexistent/taxi-stage", Vec::<String>::new());
    let result = stage.run(&mut Vec::new()).await;
    assert!(!result.is_success());
    assert_ne!(result.exit_code, 0);
}

#[tokio::test]
async fn test_standard_pipeline_end_to_end() -> EtlResult<()> {
    let dir = tempfile::tempdir()?;
    let settings = PipelineSettings::from_root(dir.path()).with_num_records(400);
    let pipeline = Pipeline::from_settings(&settings);
    assert_eq!(
        pipeline.descriptions(),
        vec![
            "Ingesting data",
            "Processing data",
            "Loading data into SQLite",
            "Generating charts"
        ]
    );

    let mut out = Vec::new();
    let report = pipeline.run(&mut out).await?;
    assert!(report.stages.iter().all(|(_, r)| r.is_success()));

    assert_eq!(shared::read_lines(&settings.raw_csv).len(), 401);
    assert!(settings.cleaned_csv.exists());
    assert!(settings.summary_csv.exists());
    let conn = rusqlite::Connection::open(&settings.database)?;
    assert_eq!(count_rows(&conn, TRIPS_TABLE)?, 400);
    for chart in ["daily_trip_volume.svg", "trip_distance_distribution.svg", "fare_amount_distribution.svg"] {
        assert!(settings.plots_dir.join(chart).exists(), "missing {}", chart);
    }

    let status = shared::captured(&out);
    assert_eq!(status.first().unwrap(), "[PIPELINE] Ingesting data…");
    assert_eq!(status.last().unwrap(), "[PIPELINE] Pipeline completed successfully.");
    assert!(status.iter().any(|l| l.starts_with("[INFO] Saved charts to")));
    Ok(())
}

#[tokio::test]
async fn test_standard_pipeline_stops_when_processing_fails() -> EtlResult<()> {
    let dir = tempfile::tempdir()?;
    let settings = PipelineSettings::from_root(dir.path()).with_num_records(10);
    // A directory where the processed files should go makes processing fail.
    std::fs::create_dir_all(settings.processed_dir.parent().unwrap())?;
    std::fs::write(&settings.processed_dir, b"not a directory")?;

    let mut out = Vec::new();
    let err = Pipeline::from_settings(&settings)
        .run(&mut out)
        .await
        .unwrap_err();
    assert!(matches!(err, EtlError::StageFailed { ref stage, .. } if stage == "Processing data"));
    let status = shared::captured(&out);
    let cause = status.last().unwrap();
    assert!(cause.starts_with("[WARN] Processing data failed: Cannot create directory"), "{}", cause);
    assert!(!settings.database.exists());
    assert!(!settings.plots_dir.exists());
    Ok(())
}
