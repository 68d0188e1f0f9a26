//! # Wiki News Digest
//!
//! Extracts the dated news list from the zh-Wikipedia news portal
//! (`Portal:新闻动态`) and saves it to several independent outputs.
//!
//! ## Features
//!
//! - Optional MediaWiki bot-password login before fetching the page
//! - Date sections located by heading id (`3月5日`), newest section skipped
//! - Citation markers stripped, empty items and empty days dropped
//! - One global, gap-free index across all kept items
//! - Text, JSON, CSV, XLSX and SQLite outputs, each failing independently
//!
//! ## Usage
//!
//! ```sh
//! wiki_news_digest -o ./results
//! WIKI_BOT_USERNAME='Me@digest' WIKI_BOT_PASSWORD=... wiki_news_digest --require store
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: Log in (if configured) and download the portal page
//! 2. **Extraction**: Headings → day lists → cleaned items → numbered records
//! 3. **Output**: Fan the records out to every sink and report per-sink results

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod errors;
mod extract;
mod models;
mod outputs;
mod utils;

use api::{LocalPage, MarkupFetcher, RetryFetch, WikiSession};
use cli::Cli;
use config::Settings;
use errors::FetchError;
use extract::{ExtractOptions, extract_news};
use outputs::{build_sinks, text::render_listing, write_all};
use utils::ensure_writable_dir;

/// Download the page, or read it from disk when `--html-file` is given.
#[instrument(level = "info", skip_all)]
async fn fetch_page(args: &Cli, settings: &Settings) -> Result<String, FetchError> {
    let source = &settings.source;
    if let Some(path) = &args.html_file {
        return LocalPage { path: path.clone() }.fetch(&source.page_url).await;
    }
    let session = WikiSession::connect(source).await?;
    RetryFetch::new(session, source.max_retries, StdDuration::from_secs(1))
        .fetch(&source.page_url)
        .await
}

#[tokio::main]
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
    info!("wiki_news_digest starting up");

    // ---- Configuration ----
    let args = Cli::parse();
    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    args.apply_overrides(&mut settings);
    debug!(?settings.output, ?settings.store, skip = settings.extract.skip_leading, "Resolved settings");

    let options = ExtractOptions::from_settings(&settings.extract)?;
    let sinks = build_sinks(&settings)?;

    // ---- Fetch ----
    let html = match fetch_page(&args, &settings).await {
        Ok(html) => html,
        Err(e) => {
            error!(url = %settings.source.page_url, error = %e, "Failed to fetch the news page");
            return Err(e.into());
        }
    };

    // ---- Extract ----
    let records = extract_news(&html, &options);
    info!(count = records.len(), "Extracted news records");
    if !args.quiet {
        print!("{}", render_listing(&records));
    }

    // ---- Output ----
    if let Err(e) = ensure_writable_dir(&settings.output.dir).await {
        error!(
            path = %settings.output.dir.display(),
            error = %e,
            "Output directory is not writable; file sinks will fail"
        );
    }
    let report = write_all(sinks, Arc::from(records)).await;
    for failed in report.failed() {
        if let Err(e) = &failed.result {
            warn!(sink = %failed.kind, required = failed.required, error = %e, "Sink did not complete");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        summary = %report.summary(),
        "Execution complete"
    );

    if report.has_required_failure() {
        return Err(format!("required sink failed ({})", report.summary()).into());
    }
    Ok(())
}
