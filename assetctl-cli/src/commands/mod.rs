//! CLI command implementations.

pub mod config;
pub mod history;
pub mod search;
pub mod view;

use std::io::IsTerminal;

use anyhow::{Context, Result};
use assetctl_core::{ApiError, FetchResult};
use assetctl_fetch::{PlatformClient, RetryExecutor};
use assetctl_store::Config;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::Cli;

// ============================================================================
// Runtime
// ============================================================================

/// Effective configuration of one invocation: file, environment, then flags.
pub struct Runtime {
    pub config: Config,
}

impl Runtime {
    /// Loads and validates the configuration for `cli`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Config::load()?,
        };
        let mut config = config.with_env_overrides()?;

        if let Some(retries) = cli.retries {
            config.retry.max_attempts = retries;
        }
        if let Some(timeout) = cli.timeout {
            config.api.timeout_secs = timeout;
        }

        config.validate()?;
        debug!(?config, "Effective configuration");
        Ok(Self { config })
    }

    /// Retry executor built from the configured policy.
    pub fn executor(&self) -> RetryExecutor {
        RetryExecutor::new(self.config.retry_policy())
    }

    /// Platform client built from the API settings.
    pub fn client(&self) -> Result<PlatformClient> {
        let token = self.config.api_token();
        if token.is_none() {
            debug!(env = %self.config.api.token_env, "No API token set, sending anonymous requests");
        }
        Ok(PlatformClient::new(
            &self.config.api.base_url,
            token,
            self.config.timeout(),
        )?)
    }
}

/// Whether a live progress line should be drawn.
pub fn show_progress(cli: &Cli) -> bool {
    !cli.quiet && std::io::stderr().is_terminal()
}

// ============================================================================
// Results
// ============================================================================

/// The terminal error to hand to a queue when closing it.
pub fn final_error<T>(outcome: &Result<FetchResult<T>, ApiError>) -> Option<ApiError> {
    match outcome {
        Ok(result) => result.partial_error.clone(),
        Err(err) => Some(err.clone()),
    }
}

/// Reports an incomplete result on stderr. The data itself is still rendered.
pub fn report_partial<T>(result: &FetchResult<T>, cli: &Cli) {
    let Some(err) = &result.partial_error else {
        return;
    };
    if cli.quiet {
        return;
    }

    let fetched = if result.items.is_empty() {
        format!("{} pages", result.meta.page_count)
    } else {
        format!("{} items", result.items.len())
    };
    match err.status_code() {
        Some(code) => eprintln!(
            "Warning: incomplete result ({fetched} fetched): {err} [{code} {}]",
            err.status()
        ),
        None => eprintln!("Warning: incomplete result ({fetched} fetched): {err}"),
    }
}

// ============================================================================
// Argument Parsing
// ============================================================================

/// Parses an RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC).
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date '{value}', expected YYYY-MM-DD or RFC 3339"))
}
