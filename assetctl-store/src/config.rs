//! Configuration management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use assetctl_fetch::host::http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use assetctl_fetch::queue::DEFAULT_CAPACITY;
use assetctl_fetch::{BackoffKind, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;

/// Overrides `api.base_url`.
pub const ENV_BASE_URL: &str = "ASSETCTL_BASE_URL";

/// Overrides `retry.max_attempts`.
pub const ENV_MAX_ATTEMPTS: &str = "ASSETCTL_MAX_ATTEMPTS";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Platform API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Retry policy for remote calls.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Event queue capacities.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Calendar-day history limits.
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Platform API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the platform API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per remote call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Backoff cap in milliseconds, 0 for none.
    #[serde(default)]
    pub max_delay_ms: u64,
    /// Backoff growth.
    #[serde(default)]
    pub backoff: BackoffKind,
}

/// Event queue capacities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Capacity of the progress queue.
    #[serde(default = "default_capacity")]
    pub progress_capacity: usize,
    /// Capacity of the item stream queue.
    #[serde(default = "default_capacity")]
    pub stream_capacity: usize,
}

/// History settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Longest day window a history request may span.
    #[serde(default = "default_max_days")]
    pub max_days: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_token_env() -> String {
    "ASSETCTL_API_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    1
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_max_days() -> u32 {
    366
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: 0,
            backoff: BackoffKind::default(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            progress_capacity: default_capacity(),
            stream_capacity: default_capacity(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_days: default_max_days(),
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("assetctl")
            .join("config.json")
    }

    /// Loads configuration from the default path.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::default_path())
    }

    /// Loads configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Applies `ASSETCTL_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if an override is present but malformed.
    pub fn with_env_overrides(self) -> Result<Self, StoreError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Fails if an override is present but malformed.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            debug!(base_url = %base_url, "Base URL overridden from environment");
            self.api.base_url = base_url;
        }

        if let Some(value) = lookup(ENV_MAX_ATTEMPTS) {
            self.retry.max_attempts =
                value
                    .trim()
                    .parse()
                    .map_err(|_| StoreError::InvalidOverride {
                        name: ENV_MAX_ATTEMPTS.to_string(),
                        value: value.clone(),
                    })?;
            debug!(max_attempts = self.retry.max_attempts, "Max attempts overridden from environment");
        }

        Ok(self)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<(), StoreError> {
        let invalid = |msg: &str| Err(StoreError::Config(msg.to_string()));

        if self.api.base_url.trim().is_empty() {
            return invalid("api.base_url must not be empty");
        }
        if self.api.timeout_secs == 0 {
            return invalid("api.timeout_secs must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be at least 1");
        }
        if self.retry.base_delay_ms == 0 {
            return invalid("retry.base_delay_ms must be at least 1");
        }
        if self.queue.progress_capacity == 0 || self.queue.stream_capacity == 0 {
            return invalid("queue capacities must be at least 1");
        }
        if self.history.max_days == 0 {
            return invalid("history.max_days must be at least 1");
        }
        Ok(())
    }

    /// Builds the retry policy used for every remote call.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.max_attempts)
            .with_base_delay(Duration::from_millis(self.retry.base_delay_ms))
            .with_max_delay(Duration::from_millis(self.retry.max_delay_ms))
            .with_backoff(self.retry.backoff)
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Reads the API token from the configured environment variable.
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api.token_env)
            .ok()
            .filter(|token| !token.is_empty())
    }
}

// ============================================================================
// Tests
// ============================================================================
