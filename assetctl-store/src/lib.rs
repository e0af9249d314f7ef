// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `assetctl` Store
//!
//! Configuration for the `assetctl` command-line client.
//!
//! Settings live in `<config dir>/assetctl/config.json`. A missing file means
//! defaults; a few values can be overridden from the environment.
//!
//! ## Usage
//!
//! ```ignore
//! use assetctl_store::Config;
//!
//! let config = Config::load()?.with_env_overrides()?;
//! config.validate()?;
//!
//! let policy = config.retry_policy();
//! let token = config.api_token();
//! ```

pub mod config;
pub mod error;

pub use config::{
    ApiConfig, Config, ENV_BASE_URL, ENV_MAX_ATTEMPTS, HistoryConfig, QueueConfig, RetryConfig,
};
pub use error::StoreError;
