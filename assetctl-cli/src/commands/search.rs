//! Search command - cursor-paged search.

use anyhow::Result;
use assetctl_fetch::operations::{self, DEFAULT_PAGE_SIZE, SearchRequest};
use assetctl_fetch::{FetchContext, PagedFetch};
use clap::Args;
use serde_json::Value;
use tracing::info;

use super::{Runtime, final_error, report_partial, show_progress};
use crate::output::{JsonFormatter, ProgressRenderer, StreamWriter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// Query in the platform's search language.
    pub query: String,

    /// Hits per page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Stop after this many pages.
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Write hits to stdout as NDJSON while they arrive.
    #[arg(long)]
    pub stream: bool,
}

/// Runs the search command.
pub async fn run(args: &SearchArgs, cli: &Cli, ctx: &FetchContext) -> Result<()> {
    let runtime = Runtime::load(cli)?;
    let client = runtime.client()?;
    let executor = runtime.executor();
    let request = SearchRequest::new(&args.query)
        .with_page_size(args.page_size)
        .with_max_pages(args.max_pages);

    info!(query = %request.query, stream = args.stream, "Searching");

    let progress = ProgressRenderer::spawn(
        runtime.config.queue.progress_capacity,
        show_progress(cli),
    );
    let writer = args
        .stream
        .then(|| StreamWriter::<Value>::spawn(runtime.config.queue.stream_capacity));

    let fetch = PagedFetch::new(ctx, &executor)
        .with_progress(progress.as_ref().map(ProgressRenderer::queue))
        .with_stream(writer.as_ref().map(StreamWriter::queue))
        .with_label("search page");

    let outcome = operations::search(&fetch, &client, &request).await;
    let final_err = final_error(&outcome);

    let streamed = match writer {
        Some(writer) => Some(writer.finish(final_err.clone()).await?),
        None => None,
    };
    if let Some(progress) = progress {
        progress.finish(final_err).await;
    }

    let result = outcome?;
    if let Some(count) = streamed {
        info!(count, "Streamed hits");
    } else {
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
    }

    report_partial(&result, cli);
    Ok(())
}
