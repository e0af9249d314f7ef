// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! assetctl - query an asset-intelligence platform from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Search, following every page
//! assetctl search 'services.port: 22'
//!
//! # Stream hits as NDJSON while they arrive
//! assetctl search 'services.port: 22' --stream
//!
//! # Look up hosts in batches
//! assetctl view --kind host 10.0.0.1 10.0.0.2
//!
//! # One snapshot per day
//! assetctl history 10.0.0.1 --from 2024-01-01 --to 2024-01-31
//!
//! # JSON output
//! assetctl --format json --pretty view --kind cert <sha256>
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use assetctl_core::ApiError;
use assetctl_fetch::FetchContext;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, history, search, view};

// ============================================================================
// CLI Definition
// ============================================================================

/// assetctl - asset-intelligence platform client.
#[derive(Parser)]
#[command(name = "assetctl")]
#[command(about = "Query hosts, certificates and web properties")]
#[command(long_about = r#"
assetctl queries an asset-intelligence platform.

Every command retries transient failures, pages through large results and
keeps whatever was fetched when a later page fails or Ctrl-C is pressed.

Examples:
  assetctl search 'services.port: 22'          # Cursor-paged search
  assetctl view --kind host 10.0.0.1           # Batched lookup
  assetctl history 10.0.0.1 --from 2024-01-01  # One snapshot per day
  assetctl --format json config show           # Effective configuration
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (no logs, no progress, no warnings).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file to use instead of the default one.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Total attempts per remote call.
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Search assets, following result pages.
    #[command(visible_alias = "s")]
    Search(search::SearchArgs),

    /// Look up assets by identifier.
    #[command(visible_alias = "v")]
    View(view::ViewArgs),

    /// Show one host snapshot per day.
    #[command(visible_alias = "h")]
    History(history::HistoryArgs),

    /// Inspect configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(u8)]
pub enum ExitCode {
    /// Success, including partial results.
    Success = 0,
    /// Hard error.
    Error = 1,
    /// Cancelled before any data arrived.
    Cancelled = 130,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("assetctl=debug,info")
    } else {
        EnvFilter::new("assetctl=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Cancels `ctx` on the first Ctrl-C.
fn cancel_on_interrupt(ctx: &FetchContext) {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, keeping what was fetched so far");
            ctx.cancel();
        }
    });
}

/// Maps a failed command to its exit code.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ApiError>() {
        Some(api) if api.is_cancellation() => ExitCode::Cancelled,
        _ => ExitCode::Error,
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let ctx = FetchContext::new();
    cancel_on_interrupt(&ctx);

    let result = match &cli.command {
        Commands::Search(args) => search::run(args, &cli, &ctx).await,
        Commands::View(args) => view::run(args, &cli, &ctx).await,
        Commands::History(args) => history::run(args, &cli, &ctx).await,
        Commands::Config(args) => config::run(args, &cli),
    };

    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            exit_code_for(&e).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_flags_after_command() {
        let cli = Cli::try_parse_from([
            "assetctl",
            "search",
            "services.port: 22",
            "--format",
            "json",
            "--retries",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.retries, Some(3));
        assert!(matches!(cli.command, Commands::Search(_)));
    }

    #[test]
    fn test_cancellation_exit_code() {
        let cancelled = anyhow::Error::new(ApiError::Cancelled);
        assert!(matches!(exit_code_for(&cancelled), ExitCode::Cancelled));

        let other = anyhow::Error::new(ApiError::unknown("boom"));
        assert!(matches!(exit_code_for(&other), ExitCode::Error));
    }
}
