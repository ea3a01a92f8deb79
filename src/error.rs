//! Error types for poke-analysis
//!
//! This module provides the error handling for the library:
//! - Configuration errors raised while loading and validating layered config files
//! - Analysis errors raised by the statistics engine
//! - Transport and serialization errors wrapped from the underlying crates
//!
//! A fetch that finds no record is *not* an error. It is reported as
//! [`FetchOutcome::Absent`](crate::types::FetchOutcome::Absent) and only turns
//! into [`Error::FetchFailed`] under
//! [`PartialFetchPolicy::FailFast`](crate::config::PartialFetchPolicy::FailFast).

use crate::types::{AbsentReason, PokeId};
use serde::Serialize;
use serde_json::error::Category;
use thiserror::Error;

/// Result type alias for poke-analysis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for poke-analysis
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "ntfy_topic_name")
        key: Option<String>,
    },

    /// The dataset has no rows, so no statistic is defined
    #[error("cannot compute statistics over an empty dataset")]
    EmptyDataset,

    /// A requested analysis column is not part of the dataset schema
    #[error("column '{column}' is not present in the dataset")]
    MissingColumn {
        /// The requested column name
        column: String,
    },

    /// A requested analysis column holds text, not numbers
    #[error("column '{column}' is not numeric")]
    NonNumericColumn {
        /// The requested column name
        column: String,
    },

    /// A numeric column in which every cell is null
    #[error("column '{column}' has no non-null values")]
    EmptyColumn {
        /// The requested column name
        column: String,
    },

    /// A record could not be fetched and the fetch policy does not allow gaps
    #[error("failed to fetch record {id}: {reason}")]
    FetchFailed {
        /// The key that could not be fetched
        id: PokeId,
        /// Why the record was absent
        reason: AbsentReason,
    },

    /// The push notification was not accepted
    #[error("notification error: {0}")]
    Notification(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::Config`] tied to a specific configuration key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Why a record body could not be turned into a [`Record`](crate::types::Record)
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum DecodeError {
    /// The body is not well-formed JSON
    #[error("invalid JSON at line {line}, column {column}: {message}")]
    InvalidJson {
        /// Line of the syntax error (1-based)
        line: usize,
        /// Column of the syntax error (1-based)
        column: usize,
        /// Parser message
        message: String,
    },

    /// The JSON is well-formed but a required field is missing or mistyped
    #[error("payload does not match record schema: {message}")]
    Schema {
        /// Parser message naming the offending field
        message: String,
    },

    /// No entry of the `types` list sits in slot 1
    #[error("no type in slot 1")]
    MissingPrimaryType,
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        match e.classify() {
            Category::Data => DecodeError::Schema {
                message: e.to_string(),
            },
            Category::Io | Category::Syntax | Category::Eof => DecodeError::InvalidJson {
                line: e.line(),
                column: e.column(),
                message: e.to_string(),
            },
        }
    }
}
