//! Range-to-table assembly
//!
//! [`DatasetBuilder`] sweeps a [`RangeSpec`] in ascending key order, asks its
//! [`RecordSource`] for each key, and collects the records that were found into a
//! [`Dataset`]. Keys that produce no record are handled by the configured
//! [`PartialFetchPolicy`].

use crate::config::{ApiConfig, PartialFetchPolicy};
use crate::error::{Error, Result};
use crate::fetcher::RecordSource;
use crate::types::{COLUMNS, ColumnValue, Event, FetchOutcome, PokeId, RangeSpec, Record};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// In-memory table of records for one pipeline run
///
/// Rows keep fetch order. The schema is the union of the rows' fields in
/// canonical column order, so `secondary` only appears when some row has it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Dataset {
    rows: Vec<Record>,
    columns: Vec<&'static str>,
}

impl Dataset {
    /// Build a dataset from already-fetched records
    pub fn from_records(rows: Vec<Record>) -> Self {
        let columns = COLUMNS
            .into_iter()
            .filter(|column| rows.iter().any(|r| r.field_names().any(|f| f == *column)))
            .collect();
        Self { rows, columns }
    }

    /// Rows in fetch order
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names of the schema
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Whether `column` is part of the schema
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    /// All cells of a column, one per row
    ///
    /// Rows that do not carry the column yield [`ColumnValue::Null`]. Returns `None`
    /// when the column is not in the schema.
    pub fn column(&self, column: &str) -> Option<Vec<ColumnValue>> {
        if !self.has_column(column) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|row| row.value(column).unwrap_or(ColumnValue::Null))
                .collect(),
        )
    }

}

/// What happened while sweeping a range
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BuildSummary {
    /// Number of keys in the range
    pub requested: usize,
    /// Keys that produced a row
    pub fetched: Vec<PokeId>,
    /// Keys that were dropped
    pub skipped: Vec<PokeId>,
}

/// Drives a [`RecordSource`] over a range and assembles a [`Dataset`]
pub struct DatasetBuilder {
    source: Arc<dyn RecordSource>,
    policy: PartialFetchPolicy,
    max_in_flight: usize,
    event_tx: Option<broadcast::Sender<Event>>,
}

impl DatasetBuilder {
    /// Sequential builder that skips missing records
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            policy: PartialFetchPolicy::SkipMissing,
            max_in_flight: 1,
            event_tx: None,
        }
    }

    /// Builder configured from the API settings
    pub fn from_config(source: Arc<dyn RecordSource>, api: &ApiConfig) -> Self {
        Self::new(source)
            .with_policy(api.partial_fetch_policy)
            .with_max_in_flight(api.max_concurrent_fetches)
    }

    /// Set the handling of missing records
    pub fn with_policy(mut self, policy: PartialFetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Allow up to `n` requests in flight (values below 1 are treated as 1)
    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n.max(1);
        self
    }

    /// Publish per-key events on `tx`
    pub fn with_events(mut self, tx: broadcast::Sender<Event>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Build the dataset for `range`
    ///
    /// # Errors
    ///
    /// Only under [`PartialFetchPolicy::FailFast`]: returns [`Error::FetchFailed`]
    /// for the first key without a record.
    pub async fn build(&self, range: RangeSpec) -> Result<Dataset> {
        self.build_with_summary(range)
            .await
            .map(|(dataset, _)| dataset)
    }

    /// Build the dataset for `range` and report which keys were kept or dropped
    pub async fn build_with_summary(&self, range: RangeSpec) -> Result<(Dataset, BuildSummary)> {
        debug!(
            range = %range,
            source = self.source.name(),
            in_flight = self.max_in_flight,
            "building dataset"
        );

        let source = self.source.as_ref();
        let mut outcomes = futures::stream::iter(range.ids())
            .map(|id| async move { (id, source.fetch(id).await) })
            .buffered(self.max_in_flight);

        let mut rows = Vec::new();
        let mut summary = BuildSummary {
            requested: range.len(),
            ..Default::default()
        };

        while let Some((id, outcome)) = outcomes.next().await {
            match outcome {
                FetchOutcome::Found(record) => {
                    rows.push(record);
                    summary.fetched.push(id);
                    self.emit(Event::RecordFetched { id });
                }
                FetchOutcome::Absent(reason) => match self.policy {
                    PartialFetchPolicy::SkipMissing => {
                        debug!(id = %id, reason = %reason, "skipping key without record");
                        summary.skipped.push(id);
                        self.emit(Event::RecordSkipped { id, reason });
                    }
                    PartialFetchPolicy::FailFast => {
                        return Err(Error::FetchFailed { id, reason });
                    }
                },
            }
        }

        let dataset = Dataset::from_records(rows);
        let (row_count, column_count) = dataset.shape();
        info!(
            range = %range,
            rows = row_count,
            columns = column_count,
            skipped = summary.skipped.len(),
            "dataset built"
        );
        self.emit(Event::DatasetBuilt {
            rows: row_count,
            skipped: summary.skipped.len(),
        });

        Ok((dataset, summary))
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.event_tx {
            tx.send(event).ok();
        }
    }
}
