//! Core types and events

use crate::error::{DecodeError, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Positive numeric key of a remote record
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PokeId(u32);

impl PokeId {
    /// Create a key, returning `None` for zero
    pub fn new(id: u32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    /// Raw numeric value
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive key interval `[start, end]` driving the fetch loop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RangeSpec {
    start: PokeId,
    end: PokeId,
}

impl RangeSpec {
    /// Validate and build a range
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `start` is zero or `end < start`.
    pub fn new(start: u32, end: u32) -> Result<Self> {
        let start = PokeId::new(start).ok_or_else(|| {
            Error::config("poke_id_start_of_range", "start of range must be greater than 0")
        })?;
        if end < start.get() {
            return Err(Error::config(
                "poke_id_end_of_range",
                format!(
                    "end of range ({end}) must not be less than start of range ({start})"
                ),
            ));
        }
        // end >= start > 0
        Ok(Self {
            start,
            end: PokeId(end),
        })
    }

    /// First key in the range
    pub fn start(&self) -> PokeId {
        self.start
    }

    /// Last key in the range (inclusive)
    pub fn end(&self) -> PokeId {
        self.end
    }

    /// Number of keys in the range
    pub fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize + 1
    }

    /// A validated range always holds at least one key
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Keys in ascending order
    pub fn ids(&self) -> impl Iterator<Item = PokeId> + use<> {
        (self.start.0..=self.end.0).map(PokeId)
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// A single cell of the dataset
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    /// Numeric value
    Number(f64),
    /// Text value (species and type names)
    Text(String),
    /// Missing value
    Null,
}

impl ColumnValue {
    /// Numeric view of the cell, if it holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Canonical column order of a dataset
pub const COLUMNS: [&str; 7] = [
    "base_experience",
    "height",
    "id",
    "species",
    "primary",
    "secondary",
    "weight",
];

/// One normalized entity fetched from the remote API
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    /// Experience gained for defeating this entity (null for some entries)
    pub base_experience: Option<u32>,
    /// Height in decimetres
    pub height: u32,
    /// Identifier reported by the API
    pub id: u32,
    /// Species name
    pub species: String,
    /// Type name in slot 1
    pub primary: String,
    /// Type name in the last non-1 slot, if any
    pub secondary: Option<String>,
    /// Weight in hectograms
    pub weight: u32,
}

impl Record {
    /// Value of a column for this record
    ///
    /// Returns `None` when the record does not carry the column at all
    /// (an unknown name, or `secondary` left unset).
    pub fn value(&self, column: &str) -> Option<ColumnValue> {
        let value = match column {
            "base_experience" => self
                .base_experience
                .map_or(ColumnValue::Null, |v| ColumnValue::Number(f64::from(v))),
            "height" => ColumnValue::Number(f64::from(self.height)),
            "id" => ColumnValue::Number(f64::from(self.id)),
            "species" => ColumnValue::Text(self.species.clone()),
            "primary" => ColumnValue::Text(self.primary.clone()),
            "secondary" => ColumnValue::Text(self.secondary.clone()?),
            "weight" => ColumnValue::Number(f64::from(self.weight)),
            _ => return None,
        };
        Some(value)
    }

    /// Names of the fields this record carries, in canonical order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        COLUMNS
            .into_iter()
            .filter(|name| *name != "secondary" || self.secondary.is_some())
    }
}

/// Why a fetch produced no record
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AbsentReason {
    /// Remote answered with a non-200 status
    Status(u16),
    /// The request never produced a response (connection, timeout, body read)
    Transport(String),
    /// The body did not match the expected record schema
    Malformed(DecodeError),
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsentReason::Status(code) => write!(f, "remote returned HTTP {code}"),
            AbsentReason::Transport(msg) => write!(f, "transport failure: {msg}"),
            AbsentReason::Malformed(e) => write!(f, "malformed payload: {e}"),
        }
    }
}

/// Outcome of a single-key fetch
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// The record was fetched and decoded
    Found(Record),
    /// No record for this key; the row is skipped
    Absent(AbsentReason),
}

impl FetchOutcome {
    /// Convert into an `Option`, discarding the absence reason
    pub fn into_record(self) -> Option<Record> {
        match self {
            FetchOutcome::Found(record) => Some(record),
            FetchOutcome::Absent(_) => None,
        }
    }
}

/// Summary statistic computed per column
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    /// Smallest value
    Min,
    /// Largest value
    Max,
    /// Arithmetic mean
    Mean,
    /// Median (mean of the two central values for even counts)
    Median,
}

impl Statistic {
    /// All statistics, in reporting order
    pub const ALL: [Statistic; 4] = [
        Statistic::Min,
        Statistic::Max,
        Statistic::Mean,
        Statistic::Median,
    ];

    /// Lowercase name used in results and messages
    pub fn as_str(self) -> &'static str {
        match self {
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Mean => "mean",
            Statistic::Median => "median",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Event emitted during a pipeline run
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A record was fetched and added to the dataset
    RecordFetched {
        /// Key that was fetched
        id: PokeId,
    },

    /// A key produced no record and was left out of the dataset
    RecordSkipped {
        /// Key that was skipped
        id: PokeId,
        /// Why no record was produced
        reason: AbsentReason,
    },

    /// The dataset for the configured range is complete
    DatasetBuilt {
        /// Number of rows in the dataset
        rows: usize,
        /// Number of keys skipped
        skipped: usize,
    },

    /// Statistics were computed
    AnalysisComplete {
        /// Columns that were analyzed
        columns: Vec<String>,
    },

    /// The analysis step failed
    AnalysisFailed {
        /// Error message
        error: String,
    },

    /// The optional report file could not be written; the run still succeeds
    ReportWriteFailed {
        /// Error message
        error: String,
    },

    /// The completion notification could not be delivered
    NotificationFailed {
        /// Error message
        error: String,
    },
}
