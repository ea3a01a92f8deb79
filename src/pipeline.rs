//! Pipeline driver: build the dataset, analyze it, notify
//!
//! The driver owns one instance of each component, all configured from a single
//! validated [`Config`]. A run is strictly sequential: the dataset is complete
//! before statistics are computed, and the notification is sent last.

use crate::config::{Config, ConfigLoader, NotifyPolicy};
use crate::dataset::{BuildSummary, Dataset, DatasetBuilder};
use crate::error::Result;
use crate::fetcher::{HttpRecordFetcher, RecordSource};
use crate::notifier::{NoOpNotifier, Notifier, NtfyNotifier};
use crate::stats::{StatsEngine, StatsResult};
use crate::types::{Event, RangeSpec};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// File name of the report written into `job_dir_path`
pub const REPORT_FILE_NAME: &str = "analysis_report.json";

/// Everything a successful run produced
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the analysis finished
    pub finished_at: DateTime<Utc>,
    /// Requested key range
    pub range: RangeSpec,
    /// Keys kept and dropped while building the dataset
    pub summary: BuildSummary,
    /// Statistics per analyzed column
    pub statistics: StatsResult,
    /// The assembled dataset
    pub dataset: Dataset,
}

/// Runs the fetch, assemble, aggregate and notify sequence
pub struct Pipeline {
    config: Config,
    range: RangeSpec,
    builder: DatasetBuilder,
    engine: StatsEngine,
    notifier: Arc<dyn Notifier>,
    event_tx: broadcast::Sender<Event>,
}

impl Pipeline {
    /// Create a pipeline talking to the configured API and ntfy server
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration is
    /// invalid, or a network error if an HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let source: Arc<dyn RecordSource> = Arc::new(HttpRecordFetcher::new(&config.api)?);
        let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
            Arc::new(NtfyNotifier::new(
                &config.notifications,
                &config.ntfy_topic_name,
            )?)
        } else {
            Arc::new(NoOpNotifier)
        };
        Self::with_components(config, source, notifier)
    }

    /// Load layered configuration and create a pipeline from it
    pub fn from_files(loader: &ConfigLoader, job_config: impl AsRef<Path>) -> Result<Self> {
        Self::new(loader.load(job_config)?)
    }

    /// Create a pipeline with explicit record source and notifier
    pub fn with_components(
        config: Config,
        source: Arc<dyn RecordSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;
        let range = config.range()?;
        let (event_tx, _) = broadcast::channel(256);
        let builder =
            DatasetBuilder::from_config(source, &config.api).with_events(event_tx.clone());
        let engine = StatsEngine::with_statistics(config.analysis.statistics.iter().copied());

        Ok(Self {
            config,
            range,
            builder,
            engine,
            notifier,
            event_tx,
        })
    }

    /// Subscribe to pipeline events
    ///
    /// Events are only delivered to receivers that exist when they are sent, so
    /// subscribe before calling [`run`](Self::run).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this pipeline was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the pipeline once
    ///
    /// Notifies after a successful analysis. With
    /// [`NotifyPolicy::Always`] a failed run also sends a failure message. The
    /// notification outcome never changes the returned result.
    ///
    /// # Errors
    ///
    /// Returns the first error of the build or analysis step. A report that
    /// cannot be written is logged and published as
    /// [`Event::ReportWriteFailed`] instead.
    pub async fn run(&self) -> Result<AnalysisReport> {
        match self.execute().await {
            Ok(report) => {
                self.notify(&self.completion_message()).await;
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "pipeline run failed");
                if self.config.notifications.notify_on == NotifyPolicy::Always {
                    self.notify(&format!("Analysis failed: {e}")).await;
                }
                Err(e)
            }
        }
    }

    /// Build the dataset for the configured range without analyzing it
    pub async fn load_data(&self) -> Result<Dataset> {
        self.builder.build(self.range).await
    }

    async fn execute(&self) -> Result<AnalysisReport> {
        let started_at = Utc::now();
        let (dataset, summary) = self.builder.build_with_summary(self.range).await?;

        let columns = &self.config.analysis.columns;
        let statistics = match self.engine.compute(&dataset, columns) {
            Ok(statistics) => statistics,
            Err(e) => {
                self.emit(Event::AnalysisFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };
        info!(rows = dataset.len(), columns = ?columns, "analysis complete");
        self.emit(Event::AnalysisComplete {
            columns: columns.clone(),
        });

        let report = AnalysisReport {
            started_at,
            finished_at: Utc::now(),
            range: self.range,
            summary,
            statistics,
            dataset,
        };

        if self.config.analysis.write_report {
            match write_report(&self.config.job_dir_path, &report).await {
                Ok(path) => info!(path = %path.display(), "analysis report written"),
                Err(e) => {
                    warn!(
                        job_dir = %self.config.job_dir_path.display(),
                        error = %e,
                        "failed to write analysis report"
                    );
                    self.emit(Event::ReportWriteFailed {
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Message sent after a successful run
    pub fn completion_message(&self) -> String {
        let settings = &self.config.notifications;
        if !settings.include_summary {
            return settings.message.clone();
        }
        let statistics: Vec<&str> = self
            .config
            .analysis
            .statistics
            .iter()
            .map(|s| s.as_str())
            .collect();
        format!(
            "{} ({} of {})",
            settings.message,
            statistics.join(", "),
            self.config.analysis.columns.join(", ")
        )
    }

    async fn notify(&self, message: &str) {
        if let Err(e) = self.notifier.send(message).await {
            warn!(notifier = self.notifier.name(), error = %e, "notification failed");
            self.emit(Event::NotificationFailed {
                error: e.to_string(),
            });
        }
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

/// Write `report` as pretty JSON into `job_dir`, creating the directory
pub async fn write_report(job_dir: &Path, report: &AnalysisReport) -> Result<PathBuf> {
    tokio::fs::create_dir_all(job_dir).await?;
    let path = job_dir.join(REPORT_FILE_NAME);
    let json = serde_json::to_vec_pretty(report)?;
    tokio::fs::write(&path, json).await?;
    Ok(path)
}
