//! Configuration types and layered YAML loading for poke-analysis
//!
//! Configuration is assembled from several YAML files. Later layers replace the
//! top-level keys of earlier ones, so a job file can override anything set in the
//! system or user configuration. The merged mapping is decoded into [`Config`]
//! and validated once; components receive the validated value by reference.

use crate::error::{Error, Result};
use crate::types::{RangeSpec, Statistic};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

/// Config layers loaded before the job file, in merge order
pub const DEFAULT_CONFIG_LAYERS: [&str; 2] =
    ["configs/system_config.yml", "configs/user_config.yml"];

/// ntfy.sh topic names: 1-64 characters of letters, digits, `-` and `_`
#[allow(clippy::expect_used)]
static TOPIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[-_A-Za-z0-9]{1,64}$").expect("topic pattern is valid"));

/// What to do when a key in the range produces no record
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialFetchPolicy {
    /// Drop the row and continue with the next key (default)
    #[default]
    SkipMissing,
    /// Abort the build on the first missing record
    FailFast,
}

/// When the completion notification is sent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Only after the analysis step succeeds (default)
    #[default]
    Success,
    /// After every run; failed runs send a failure message
    Always,
}

/// Remote API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme and host of the API (default: "https://pokeapi.co")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Resource path segment under `/api/v2/` (default: "pokemon")
    #[serde(default = "default_resource")]
    pub resource: String,

    /// Per-request timeout in seconds (default: unset, the HTTP client's own behavior)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "duration_serde::option"
    )]
    pub timeout: Option<Duration>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Requests kept in flight while sweeping the range (default: 1 = sequential)
    ///
    /// Values above 1 overlap requests but the dataset keeps ascending key order.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Handling of keys that produce no record
    #[serde(default)]
    pub partial_fetch_policy: PartialFetchPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            resource: default_resource(),
            timeout: None,
            user_agent: default_user_agent(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            partial_fetch_policy: PartialFetchPolicy::default(),
        }
    }
}

/// Analysis settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Numeric columns to analyze (default: base_experience, height, weight)
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,

    /// Statistics to compute (default: all four)
    #[serde(default = "default_statistics")]
    pub statistics: Vec<Statistic>,

    /// Write `analysis_report.json` into `job_dir_path` after a successful run
    #[serde(default)]
    pub write_report: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            statistics: default_statistics(),
            write_report: false,
        }
    }
}

/// Push notification settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Send notifications at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// ntfy server base URL (default: "https://ntfy.sh")
    #[serde(default = "default_ntfy_server")]
    pub server: String,

    /// Timeout for the notification POST in seconds (default: 10)
    #[serde(default = "default_notify_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Message sent on completion (default: "Analysis Complete!")
    #[serde(default = "default_message")]
    pub message: String,

    /// Append the analyzed columns and statistics to the message
    #[serde(default)]
    pub include_summary: bool,

    /// Which runs trigger a notification
    #[serde(default)]
    pub notify_on: NotifyPolicy,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            server: default_ntfy_server(),
            timeout: default_notify_timeout(),
            message: default_message(),
            include_summary: false,
            notify_on: NotifyPolicy::default(),
        }
    }
}

/// Main configuration for a pipeline run
///
/// The four top-level keys are required in the merged configuration. The nested
/// sections are optional and fall back to their defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory for job outputs
    pub job_dir_path: PathBuf,

    /// First key of the range (must be > 0)
    pub poke_id_start_of_range: u32,

    /// Last key of the range, inclusive (must be >= start)
    pub poke_id_end_of_range: u32,

    /// ntfy.sh topic that receives the completion notification
    pub ntfy_topic_name: String,

    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Notification settings
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Config {
    /// Build a configuration with default sections
    pub fn new(
        job_dir_path: impl Into<PathBuf>,
        range: RangeSpec,
        ntfy_topic_name: impl Into<String>,
    ) -> Self {
        Self {
            job_dir_path: job_dir_path.into(),
            poke_id_start_of_range: range.start().get(),
            poke_id_end_of_range: range.end().get(),
            ntfy_topic_name: ntfy_topic_name.into(),
            api: ApiConfig::default(),
            analysis: AnalysisConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }

    /// The validated key range
    pub fn range(&self) -> Result<RangeSpec> {
        RangeSpec::new(self.poke_id_start_of_range, self.poke_id_end_of_range)
    }

    /// Check every precondition the pipeline relies on
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.job_dir_path.as_os_str().is_empty() {
            return Err(Error::config("job_dir_path", "job_dir_path must not be empty"));
        }

        if self.ntfy_topic_name.is_empty() {
            return Err(Error::config(
                "ntfy_topic_name",
                "ntfy_topic_name must not be empty",
            ));
        }
        if !TOPIC_RE.is_match(&self.ntfy_topic_name) {
            return Err(Error::config(
                "ntfy_topic_name",
                format!(
                    "ntfy_topic_name '{}' may only contain letters, digits, '-' and '_' (max 64)",
                    self.ntfy_topic_name
                ),
            ));
        }

        self.range()?;

        let base = url::Url::parse(&self.api.base_url).map_err(|e| {
            Error::config("api.base_url", format!("invalid base URL '{}': {e}", self.api.base_url))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::config(
                "api.base_url",
                format!("base URL must use http or https, got '{}'", base.scheme()),
            ));
        }
        if self.api.resource.trim().is_empty() {
            return Err(Error::config("api.resource", "api.resource must not be empty"));
        }
        if self.api.max_concurrent_fetches == 0 {
            return Err(Error::config(
                "api.max_concurrent_fetches",
                "api.max_concurrent_fetches must be at least 1",
            ));
        }

        if self.analysis.columns.is_empty() {
            return Err(Error::config(
                "analysis.columns",
                "at least one analysis column is required",
            ));
        }
        if self.analysis.statistics.is_empty() {
            return Err(Error::config(
                "analysis.statistics",
                "at least one statistic is required",
            ));
        }

        if self.notifications.enabled {
            url::Url::parse(&self.notifications.server).map_err(|e| {
                Error::config(
                    "notifications.server",
                    format!("invalid ntfy server URL '{}': {e}", self.notifications.server),
                )
            })?;
        }

        Ok(())
    }
}

/// Loads and merges layered YAML configuration files
#[derive(Clone, Debug)]
pub struct ConfigLoader {
    layers: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            layers: DEFAULT_CONFIG_LAYERS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl ConfigLoader {
    /// Loader using [`DEFAULT_CONFIG_LAYERS`] relative to the working directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with explicit base layers (applied before the job file, in order)
    pub fn with_layers<I, P>(layers: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            layers: layers.into_iter().map(Into::into).collect(),
        }
    }

    /// Load the base layers plus `job_config`, merge them, and validate
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the job path is not a `.yml` file, a layer
    /// is missing, empty or not a mapping, a required key is missing or
    /// mistyped, or validation fails.
    pub fn load(&self, job_config: impl AsRef<Path>) -> Result<Config> {
        let job_config = job_config.as_ref();
        if job_config.extension().and_then(|e| e.to_str()) != Some("yml") {
            return Err(Error::Config {
                message: format!(
                    "analysis config path must be a path to a yml file: {}",
                    job_config.display()
                ),
                key: None,
            });
        }

        let mut merged = serde_yaml::Mapping::new();
        for path in self.layers.iter().map(PathBuf::as_path).chain([job_config]) {
            let layer = read_layer(path)?;
            debug!(path = %path.display(), keys = layer.len(), "merging config layer");
            merge_layer(&mut merged, layer);
        }

        let config = decode(merged)?;
        config.validate()?;

        info!(
            job_dir = %config.job_dir_path.display(),
            range = %config.range()?,
            topic = %config.ntfy_topic_name,
            "configuration loaded"
        );
        Ok(config)
    }
}

/// Decode a merged mapping into [`Config`] without validating it
pub fn decode(merged: serde_yaml::Mapping) -> Result<Config> {
    serde_yaml::from_value(serde_yaml::Value::Mapping(merged)).map_err(|e| Error::Config {
        message: format!("invalid configuration: {e}"),
        key: None,
    })
}

/// Replace top-level keys of `base` with those of `layer`
pub fn merge_layer(base: &mut serde_yaml::Mapping, layer: serde_yaml::Mapping) {
    for (key, value) in layer {
        base.insert(key, value);
    }
}

fn read_layer(path: &Path) -> Result<serde_yaml::Mapping> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("failed to read config file '{}': {e}", path.display()),
        key: None,
    })?;

    let value = serde_yaml::from_str::<serde_yaml::Value>(&content).map_err(|e| Error::Config {
        message: format!("failed to parse config file '{}': {e}", path.display()),
        key: None,
    })?;

    match value {
        serde_yaml::Value::Mapping(mapping) => Ok(mapping),
        serde_yaml::Value::Null => Err(Error::Config {
            message: format!("config file '{}' is empty", path.display()),
            key: None,
        }),
        _ => Err(Error::Config {
            message: format!("config file '{}' must contain a YAML mapping", path.display()),
            key: None,
        }),
    }
}

fn default_base_url() -> String {
    "https://pokeapi.co".to_string()
}

fn default_resource() -> String {
    "pokemon".to_string()
}

fn default_user_agent() -> String {
    concat!("poke-analysis/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_concurrent_fetches() -> usize {
    1
}

fn default_columns() -> Vec<String> {
    ["base_experience", "height", "weight"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_statistics() -> Vec<Statistic> {
    Statistic::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

fn default_ntfy_server() -> String {
    "https://ntfy.sh".to_string()
}

fn default_notify_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_message() -> String {
    "Analysis Complete!".to_string()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => serializer.serialize_some(&d.as_secs()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
        }
    }
}
