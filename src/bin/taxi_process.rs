//! Clean the raw taxi trips and aggregate a daily per-vendor summary.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use taxi_etl::pipeline::Stage;
use taxi_etl::stages::ProcessStage;

#[derive(Parser)]
#[command(name = "taxi-process")]
#[command(about = "Clean and aggregate raw taxi trip data.", long_about = None)]
struct Cli {
    /// Path to the raw trips CSV file.
    #[arg(long, default_value = "data/raw/yellow_tripdata_2025-01.csv")]
    input: PathBuf,

    /// Directory for cleaned_trips.csv and trip_summary.csv.
    #[arg(long, default_value = "data/processed")]
    output_dir: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let stage = ProcessStage {
        input: cli.input,
        output_dir: cli.output_dir,
    };
    let result = stage.run(&mut std::io::stdout()).await;
    if !result.is_success() {
        eprintln!("Error: {}", result.message);
    }
    ExitCode::from(result.exit_code.clamp(0, 255) as u8)
}
