//! Configuration for the local function host.
//!
//! The defaults match a local development host: task hub `TestHubName`
//! backed by the `Storage` connection, and a short status polling interval.

use std::env;
use std::time::Duration;

/// Environment variable overriding [`HostConfig::task_hub`].
pub const TASK_HUB_ENV: &str = "DURABLE_TASK_HUB";
/// Environment variable overriding [`HostConfig::connection_name`].
pub const CONNECTION_NAME_ENV: &str = "DURABLE_CONNECTION_NAME";
/// Environment variable overriding [`HostConfig::status_poll_interval`], in milliseconds.
pub const STATUS_POLL_MS_ENV: &str = "DURABLE_STATUS_POLL_MS";

const DEFAULT_TASK_HUB: &str = "TestHubName";
const DEFAULT_CONNECTION_NAME: &str = "Storage";
const DEFAULT_STATUS_POLL_MS: u64 = 50;

/// Settings shared by the host and its clients.
///
/// # Example
///
/// ```rust
/// use durable_decimal::HostConfig;
/// use std::time::Duration;
///
/// let config = HostConfig::default()
///     .with_task_hub("GreetingHub")
///     .with_status_poll_interval(Duration::from_millis(10));
///
/// assert_eq!(config.task_hub, "GreetingHub");
/// assert_eq!(config.connection_name, "Storage");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Task hub name placed in every management URI
    pub task_hub: String,
    /// Storage connection name placed in every management URI
    pub connection_name: String,
    /// How often [`DurableClient::wait_for_completion`](crate::DurableClient::wait_for_completion) re-checks status
    pub status_poll_interval: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            task_hub: DEFAULT_TASK_HUB.to_string(),
            connection_name: DEFAULT_CONNECTION_NAME.to_string(),
            status_poll_interval: Duration::from_millis(DEFAULT_STATUS_POLL_MS),
        }
    }
}

impl HostConfig {
    /// Reads the configuration from the environment.
    ///
    /// Missing or unparseable variables fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let status_poll_interval = match lookup(STATUS_POLL_MS_ENV).map(|v| v.parse::<u64>()) {
            Some(Ok(ms)) if ms > 0 => Duration::from_millis(ms),
            Some(_) => {
                tracing::warn!(
                    variable = STATUS_POLL_MS_ENV,
                    "Ignoring invalid status poll interval, using default"
                );
                defaults.status_poll_interval
            }
            None => defaults.status_poll_interval,
        };

        Self {
            task_hub: lookup(TASK_HUB_ENV)
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.task_hub),
            connection_name: lookup(CONNECTION_NAME_ENV)
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.connection_name),
            status_poll_interval,
        }
    }

    /// Sets the task hub name.
    pub fn with_task_hub(mut self, task_hub: impl Into<String>) -> Self {
        self.task_hub = task_hub.into();
        self
    }

    /// Sets the storage connection name.
    pub fn with_connection_name(mut self, connection_name: impl Into<String>) -> Self {
        self.connection_name = connection_name.into();
        self
    }

    /// Sets the status polling interval.
    pub fn with_status_poll_interval(mut self, interval: Duration) -> Self {
        self.status_poll_interval = interval;
        self
    }
}
