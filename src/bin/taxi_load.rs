//! Load the processed taxi data into a SQLite database.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use taxi_etl::pipeline::Stage;
use taxi_etl::stages::LoadStage;

#[derive(Parser)]
#[command(name = "taxi-load")]
#[command(about = "Load processed taxi data into SQLite.", long_about = None)]
struct Cli {
    /// Path to the cleaned trips CSV file.
    #[arg(long, default_value = "data/processed/cleaned_trips.csv")]
    trips: PathBuf,

    /// Path to the trip summary CSV file.
    #[arg(long, default_value = "data/processed/trip_summary.csv")]
    summary: PathBuf,

    /// Path to the SQLite database file.
    #[arg(long, default_value = "database/taxi_trips.db")]
    db: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let stage = LoadStage {
        trips: cli.trips,
        summary: cli.summary,
        database: cli.db,
    };
    let result = stage.run(&mut std::io::stdout()).await;
    if !result.is_success() {
        eprintln!("Error: {}", result.message);
    }
    ExitCode::from(result.exit_code.clamp(0, 255) as u8)
}
