//! Ingest NYC taxi trip data: download a TLC Parquet file and convert it to CSV, or generate a
//! synthetic dataset with the same schema.
//!
//! ```sh
//! taxi-ingest --url https://d37ci6vzurychx.cloudfront.net/trip-data/yellow_tripdata_2025-01.parquet \
//!     --output data/raw/yellow_tripdata_2025-01.csv
//! taxi-ingest --generate-synthetic --num-records 50000
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use taxi_etl::stages::ingestion::{IngestOptions, Ingestion, DEFAULT_NUM_RECORDS, DEFAULT_OUTPUT};

#[derive(Parser)]
#[command(name = "taxi-ingest")]
#[command(about = "Ingest NYC taxi trip data.", long_about = None)]
struct Cli {
    /// URL of the Parquet file to download. If omitted, synthetic data will be generated.
    #[arg(long, env = "TAXI_ETL_SOURCE_URL")]
    url: Option<String>,

    /// Path to the output CSV file.
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Force generation of synthetic data instead of downloading.
    #[arg(long)]
    generate_synthetic: bool,

    /// Number of synthetic records to generate.
    #[arg(long, default_value_t = DEFAULT_NUM_RECORDS)]
    num_records: usize,

    /// Seed for reproducible synthetic data.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let ingestion = Ingestion::new(IngestOptions {
        url: cli.url,
        output: cli.output,
        generate_synthetic: cli.generate_synthetic,
        num_records: cli.num_records,
        seed: cli.seed,
    });
    let mut stdout = std::io::stdout();
    match ingestion.run(&mut stdout).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code().clamp(1, 255) as u8)
        }
    }
}
