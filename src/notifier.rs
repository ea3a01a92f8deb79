//! Completion notifications via ntfy.sh

use crate::config::NotificationConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::debug;

/// Sends short text messages to a push-notification topic
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message`
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be delivered. Callers treat
    /// delivery as best-effort and do not abort on failure.
    async fn send(&self, message: &str) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Posts plain-text messages to `{server}/{topic}`
pub struct NtfyNotifier {
    client: reqwest::Client,
    url: String,
}

impl NtfyNotifier {
    /// Create a notifier for `topic` using the notification settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(settings: &NotificationConfig, topic: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        let url = format!(
            "{}/{}",
            settings.server.trim_end_matches('/'),
            urlencoding::encode(topic)
        );
        Ok(Self { client, url })
    }

    /// Topic URL messages are posted to
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .body(message.as_bytes().to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Notification(format!(
                "ntfy returned status {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        debug!(url = %self.url, "notification sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ntfy"
    }
}

/// Notifier used when notifications are disabled; drops every message
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        debug!(message, "notifications disabled, dropping message");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
