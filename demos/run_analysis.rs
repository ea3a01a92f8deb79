//! Run the analysis pipeline from layered configuration files
//!
//! Loads `configs/system_config.yml`, `configs/user_config.yml` and the job file
//! given on the command line (default: `configs/job_file.yml`), then prints the
//! statistics as they are computed.
//!
//! ```bash
//! cargo run --example run_analysis -- configs/job_file.yml
//! ```

use poke_analysis::{ConfigLoader, Event, Pipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let job = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "configs/job_file.yml".to_string());

    let pipeline = Pipeline::from_files(&ConfigLoader::new(), &job)?;

    let mut events = pipeline.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::RecordFetched { id } => println!("✓ fetched #{id}"),
                Event::RecordSkipped { id, reason } => println!("✗ skipped #{id}: {reason}"),
                Event::DatasetBuilt { rows, skipped } => {
                    println!("dataset: {rows} rows ({skipped} skipped)")
                }
                Event::ReportWriteFailed { error } => println!("report not written: {error}"),
                Event::NotificationFailed { error } => println!("notification failed: {error}"),
                _ => {}
            }
        }
    });

    let report = pipeline.run().await?;

    for statistic in report.statistics.statistics() {
        if let Some(values) = report.statistics.statistic(statistic) {
            for (column, value) in values {
                println!("{statistic:>6} {column:<16} {value:>10.4}");
            }
        }
    }

    Ok(())
}
