//! History command - one host snapshot per calendar day.

use anyhow::Result;
use assetctl_fetch::{DayRange, FetchContext, PagedFetch, operations};
use chrono::{DateTime, Utc};
use clap::Args;
use tracing::info;

use super::{Runtime, final_error, parse_instant, report_partial, show_progress};
use crate::output::{JsonFormatter, ProgressRenderer, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the history command.
#[derive(Args)]
pub struct HistoryArgs {
    /// Host IP address.
    pub host: String,

    /// First day (YYYY-MM-DD or RFC 3339).
    #[arg(long, value_parser = parse_instant)]
    pub from: DateTime<Utc>,

    /// Last day, inclusive. Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    pub to: Option<DateTime<Utc>>,
}

/// Runs the history command.
pub async fn run(args: &HistoryArgs, cli: &Cli, ctx: &FetchContext) -> Result<()> {
    let runtime = Runtime::load(cli)?;
    let to = args.to.unwrap_or_else(Utc::now);
    let range = DayRange::new(args.from, to, runtime.config.history.max_days)?;
    let client = runtime.client()?;
    let executor = runtime.executor();

    info!(host = %args.host, days = range.len(), "Fetching history");

    let progress = ProgressRenderer::spawn(
        runtime.config.queue.progress_capacity,
        show_progress(cli),
    );
    let fetch = PagedFetch::new(ctx, &executor)
        .with_progress(progress.as_ref().map(ProgressRenderer::queue))
        .with_label(args.host.clone());

    let outcome = operations::history(&fetch, &client, &args.host, range).await;
    if let Some(progress) = progress {
        progress.finish(final_error(&outcome)).await;
    }

    let result = outcome?;
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_history(&result.items));
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
