//! Poller configuration
//!
//! Defines the sweep interval, the retry policy and where the layout
//! endpoint lives.

use std::time::Duration;

use crate::scheduler::retry::RetryPolicy;

const DEFAULT_ENDPOINT_URL: &str = "http://localhost:3000";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Identifies this poller instance in logs when several replicas run
    pub worker_id: String,

    /// Base URL of the server hosting the layout endpoint
    pub endpoint_url: String,

    /// Time between sweeps
    pub poll_interval: Duration,

    /// Dispatch attempts and backoff
    pub retry: RetryPolicy,
}

impl PollerConfig {
    /// Creates a new configuration with defaults
    pub fn new(worker_id: String, endpoint_url: String) -> Self {
        Self {
            worker_id,
            endpoint_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognized environment variables:
    /// - WORKER_ID (optional, default: random UUID)
    /// - DEPLOYED_URL (optional, default: http://localhost:3000)
    /// - POLL_INTERVAL (optional, seconds, default: 60)
    /// - MAX_ATTEMPTS (optional, default: 5)
    /// - RETRY_BACKOFF_MS (optional, milliseconds, default: 2000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let worker_id = std::env::var("WORKER_ID").unwrap_or(defaults.worker_id);

        let endpoint_url = std::env::var("DEPLOYED_URL").unwrap_or(defaults.endpoint_url);

        let poll_interval = std::env::var("POLL_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);

        let max_attempts = std::env::var("MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.retry.max_attempts);

        let backoff_step = std::env::var("RETRY_BACKOFF_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry.backoff_step);

        Self {
            worker_id,
            endpoint_url,
            poll_interval,
            retry: RetryPolicy::new(max_attempts, backoff_step),
        }
    }

    /// Overrides the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_id.is_empty() {
            anyhow::bail!("worker_id cannot be empty");
        }

        if self.endpoint_url.is_empty() {
            anyhow::bail!("endpoint_url cannot be empty");
        }

        if !self.endpoint_url.starts_with("http://") && !self.endpoint_url.starts_with("https://")
        {
            anyhow::bail!("endpoint_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        Ok(())
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            DEFAULT_ENDPOINT_URL.to_string(),
        )
    }
}
