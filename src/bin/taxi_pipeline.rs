//! Run the whole taxi pipeline: ingest, process, load, chart.
//!
//! Paths are fixed under the repository root (`TAXI_ETL_ROOT` overrides it). The exit code is
//! that of the first failing stage, or 0 when every stage succeeds.

use std::process::ExitCode;
use taxi_etl::pipeline::Pipeline;
use taxi_etl::settings::PipelineSettings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let settings = PipelineSettings::from_env();
    let mut stdout = std::io::stdout();
    match Pipeline::from_settings(&settings).run(&mut stdout).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code().clamp(1, 255) as u8)
        }
    }
}
