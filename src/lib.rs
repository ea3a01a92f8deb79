//! # poke-analysis
//!
//! Configuration-driven fetch, assemble and aggregate pipeline over the PokeAPI.
//!
//! ## Design Philosophy
//!
//! poke-analysis is designed to be:
//! - **Configuration-driven** - Range, endpoints, topic and outputs come from layered YAML files
//! - **Best-effort** - A key without a record shrinks the dataset instead of aborting the run
//! - **Library-first** - No CLI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers can subscribe to per-key and per-stage events
//!
//! ## Quick Start
//!
//! ```no_run
//! use poke_analysis::{ConfigLoader, Pipeline, Statistic};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().load("configs/job_file.yml")?;
//!     let pipeline = Pipeline::new(config)?;
//!
//!     let report = pipeline.run().await?;
//!     println!(
//!         "mean height: {:?}",
//!         report.statistics.get(Statistic::Mean, "height")
//!     );
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types and layered loading
pub mod config;
/// Dataset assembly over a key range
pub mod dataset;
/// Error types
pub mod error;
/// Single-record fetch from the remote API
pub mod fetcher;
/// Completion notifications
pub mod notifier;
/// Pipeline driver
pub mod pipeline;
/// Summary statistics
pub mod stats;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigLoader, NotifyPolicy, PartialFetchPolicy};
pub use dataset::{BuildSummary, Dataset, DatasetBuilder};
pub use error::{DecodeError, Error, Result};
pub use fetcher::{HttpRecordFetcher, RecordSource};
pub use notifier::{NoOpNotifier, Notifier, NtfyNotifier};
pub use pipeline::{AnalysisReport, Pipeline};
pub use stats::{StatsEngine, StatsResult};
pub use types::{
    AbsentReason, ColumnValue, Event, FetchOutcome, PokeId, RangeSpec, Record, Statistic,
};
