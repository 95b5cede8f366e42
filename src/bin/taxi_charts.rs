//! Generate charts from the processed taxi data.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use taxi_etl::pipeline::Stage;
use taxi_etl::stages::ChartStage;

#[derive(Parser)]
#[command(name = "taxi-charts")]
#[command(about = "Generate charts from processed taxi data.", long_about = None)]
struct Cli {
    /// Path to the cleaned trips CSV file.
    #[arg(long, default_value = "data/processed/cleaned_trips.csv")]
    cleaned: PathBuf,

    /// Path to the trip summary CSV file.
    #[arg(long, default_value = "data/processed/trip_summary.csv")]
    summary: PathBuf,

    /// Directory to store the generated charts.
    #[arg(long, default_value = "reports/plots")]
    output_dir: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let stage = ChartStage {
        cleaned: cli.cleaned,
        summary: cli.summary,
        output_dir: cli.output_dir,
    };
    let result = stage.run(&mut std::io::stdout()).await;
    if !result.is_success() {
        eprintln!("Error: {}", result.message);
    }
    ExitCode::from(result.exit_code.clamp(0, 255) as u8)
}
