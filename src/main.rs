//! # DOJ Press Digest
//!
//! Collects press releases from the Department of Justice Public Safety and
//! Crime press room for a date range and uses an LLM to distill each
//! article's narrative body, writing one JSON file that maps article URL to
//! extracted text.
//!
//! ## Usage
//!
//! ```sh
//! doj_press_digest --start-date 2025-07-31 --end-date 2025-08-01 -o extracted_article_text.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Listing**: Fetch the press-room search page for the date range
//! 2. **Pagination**: LLM extracts page links, normalized to a URL list
//! 3. **Links**: LLM extracts article URLs from each page (sequential)
//! 4. **Articles**: Fetch and distill each unique article (parallel, 5 at a time)
//! 5. **Output**: Write the URL → text mapping once, after every article finishes

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod config;
mod error;
mod extractors;
mod models;
mod orchestrator;
mod outputs;
mod pagination;
mod scrapers;
mod utils;

use cli::Cli;
use config::{Config, load_llm_config};
use extractors::LlmExtractors;
use orchestrator::Orchestrator;
use outputs::json;
use scrapers::markdown::HttpPageFetcher;
use utils::ensure_writable_parent;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("doj_press_digest starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.start_date, ?args.end_date, output = %args.output.display(), "Parsed CLI arguments");

    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid date range");
            return Err(e.into());
        }
    };
    info!(range = %config.date_range, "Resolved date range");

    // Early check: ensure the output location is writable
    if let Err(e) = ensure_writable_parent(&config.output_path).await {
        error!(
            path = %config.output_path.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    // ---- Load LLM config & templates ----
    let llm_config = match load_llm_config(args.config.as_deref(), args.api_key.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Could not load LLM configuration");
            return Err(e);
        }
    };
    let extractors = LlmExtractors::load(llm_config).await?;
    let fetcher = HttpPageFetcher::new(config.fetch_timeout)?;

    // ---- Listing, pagination, links, articles ----
    let outcome = Orchestrator::new(&config, &fetcher, &extractors)
        .run()
        .await?;

    // Write final JSON after all articles processed
    json::write_articles(&outcome.articles, &config.output_path).await?;

    let summary = &outcome.summary;
    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        pages_visited = summary.pages_visited,
        pages_skipped = summary.pages_skipped,
        articles = summary.articles_dispatched,
        extracted = summary.articles_extracted,
        fetch_failed = summary.fetch_failed,
        extraction_failed = summary.extraction_failed,
        extraction_empty = summary.extraction_empty,
        path = %config.output_path.display(),
        "Execution complete"
    );

    Ok(())
}
