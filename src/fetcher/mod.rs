//! Single-record fetch from the remote API
//!
//! [`RecordSource`] is the seam the dataset builder depends on.
//! [`HttpRecordFetcher`] is the production implementation: one GET per key,
//! no retries, and every failure mode folded into
//! [`FetchOutcome::Absent`] so a missing record never aborts the sweep.

mod payload;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{AbsentReason, FetchOutcome, PokeId};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

/// Source of records keyed by [`PokeId`]
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch and normalize the record for `id`
    ///
    /// A missing record is reported as [`FetchOutcome::Absent`], never as an error.
    async fn fetch(&self, id: PokeId) -> FetchOutcome;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Fetches records over HTTP from `{base_url}/api/v2/{resource}/{id}`
pub struct HttpRecordFetcher {
    client: reqwest::Client,
    base_url: Url,
    resource: String,
}

impl HttpRecordFetcher {
    /// Create a fetcher from the API settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL cannot be parsed or cannot carry
    /// path segments, or [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&api.base_url).map_err(|e| {
            Error::config("api.base_url", format!("invalid base URL '{}': {e}", api.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(
                "api.base_url",
                format!("base URL '{}' cannot carry a path", api.base_url),
            ));
        }

        let mut builder = reqwest::Client::builder().user_agent(api.user_agent.as_str());
        if let Some(timeout) = api.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url,
            resource: api.resource.trim_matches('/').to_string(),
        })
    }

    /// URL of the record for `id`
    pub fn record_url(&self, id: PokeId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v2", self.resource.as_str(), id.to_string().as_str()]);
        }
        url
    }
}

#[async_trait]
impl RecordSource for HttpRecordFetcher {
    async fn fetch(&self, id: PokeId) -> FetchOutcome {
        let url = self.record_url(id);

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(id = %id, url = %url, error = %e, "record request failed");
                return FetchOutcome::Absent(AbsentReason::Transport(e.to_string()));
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            debug!(id = %id, status = status.as_u16(), "no record for key");
            return FetchOutcome::Absent(AbsentReason::Status(status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(id = %id, error = %e, "failed to read record body");
                return FetchOutcome::Absent(AbsentReason::Transport(e.to_string()));
            }
        };

        match payload::decode_record(&body) {
            Ok(record) => {
                debug!(id = %id, species = %record.species, "record fetched");
                FetchOutcome::Found(record)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "record payload did not match schema");
                FetchOutcome::Absent(AbsentReason::Malformed(e))
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
