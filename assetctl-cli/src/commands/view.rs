//! View command - batched lookup by identifier.

use anyhow::{Result, bail};
use assetctl_core::ResourceKind;
use assetctl_fetch::{FetchContext, PagedFetch, operations};
use chrono::{DateTime, Utc};
use clap::Args;
use tracing::info;

use super::{Runtime, final_error, parse_instant, report_partial, show_progress};
use crate::output::{JsonFormatter, ProgressRenderer, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the view command.
#[derive(Args)]
pub struct ViewArgs {
    /// Kind of asset: host, cert or web.
    #[arg(long, short, default_value = "host")]
    pub kind: ResourceKind,

    /// Identifiers to look up (IPs, SHA-256 fingerprints or hostname:port).
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Look assets up as of this date (YYYY-MM-DD or RFC 3339).
    #[arg(long, value_parser = parse_instant)]
    pub at: Option<DateTime<Utc>>,
}

/// Runs the view command.
pub async fn run(args: &ViewArgs, cli: &Cli, ctx: &FetchContext) -> Result<()> {
    let ids: Vec<String> = args
        .ids
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        bail!("No identifiers given");
    }

    let runtime = Runtime::load(cli)?;
    let client = runtime.client()?;
    let executor = runtime.executor();

    info!(kind = %args.kind, count = ids.len(), "Looking up assets");

    let progress = ProgressRenderer::spawn(
        runtime.config.queue.progress_capacity,
        show_progress(cli),
    );
    let fetch = PagedFetch::new(ctx, &executor)
        .with_progress(progress.as_ref().map(ProgressRenderer::queue))
        .with_label(args.kind.to_string());

    let outcome = operations::view(&fetch, &client, args.kind, &ids, args.at).await;
    if let Some(progress) = progress {
        progress.finish(final_error(&outcome)).await;
    }

    let result = outcome?;
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            if !result.is_empty() {
                println!("{}", formatter.format_items(&result.items));
            }
            if !cli.quiet {
                eprintln!("{}", formatter.format_meta(&result.meta, result.len()));
            }
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&result)?);
        }
    }

    report_partial(&result, cli);
    Ok(())
}
