//! Config command - inspect configuration.

use anyhow::Result;
use assetctl_store::Config;
use clap::{Args, Subcommand};

use super::Runtime;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (file, environment and flags).
    Show,

    /// Show the configuration file path.
    Path,
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => show_path(cli),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let runtime = Runtime::load(cli)?;
    let config = &runtime.config;

    match cli.format {
        OutputFormat::Text => {
            println!("assetctl Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("API:");
            println!("  Base URL:     {}", config.api.base_url);
            println!(
                "  Token:        ${} ({})",
                config.api.token_env,
                if config.api_token().is_some() { "set" } else { "not set" }
            );
            println!("  Timeout:      {}s", config.api.timeout_secs);
            println!();
            println!("Retry:");
            println!("  Max attempts: {}", config.retry.max_attempts);
            println!("  Base delay:   {}ms", config.retry.base_delay_ms);
            if config.retry.max_delay_ms == 0 {
                println!("  Max delay:    none");
            } else {
                println!("  Max delay:    {}ms", config.retry.max_delay_ms);
            }
            println!("  Backoff:      {}", config.retry.backoff);
            println!();
            println!("Queues:");
            println!("  Progress:     {}", config.queue.progress_capacity);
            println!("  Stream:       {}", config.queue.stream_capacity);
            println!();
            println!("History:");
            println!("  Max days:     {}", config.history.max_days);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(config)?);
        }
    }

    Ok(())
}

fn show_path(cli: &Cli) -> Result<()> {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    let exists = path.exists();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Path");
            println!("{}", "─".repeat(40));
            println!();
            println!(
                "Config file: {}{}",
                path.display(),
                if exists { "" } else { " (not created, using defaults)" }
            );
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_file": path.display().to_string(),
                "exists": exists,
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}
