//! Command-line interface definitions for Wiki News Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every flag is optional; anything given here overrides the YAML config
//! file, which in turn overrides the built-in defaults.

use crate::config::{Settings, SinkKind};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Wiki News Digest application.
///
/// # Examples
///
/// ```sh
/// # Anonymous fetch, all outputs under ./results
/// wiki_news_digest
///
/// # Bot-password login, keep two "today" sections out, fail if JSON fails
/// wiki_news_digest --username 'Me@digest' --skip 2 --require json
///
/// # Offline, from a saved page, without the SQLite store
/// wiki_news_digest --html-file portal.html --no-store
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the text, JSON, CSV and XLSX outputs
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of leading date sections to skip
    #[arg(short, long)]
    pub skip: Option<usize>,

    /// News portal page URL
    #[arg(long)]
    pub page_url: Option<String>,

    /// MediaWiki api.php endpoint used for login
    #[arg(long)]
    pub api_url: Option<String>,

    /// Bot-password user name (Account@BotName)
    #[arg(long, env = "WIKI_BOT_USERNAME")]
    pub username: Option<String>,

    /// Bot password
    #[arg(long, env = "WIKI_BOT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read the page from a local HTML file instead of fetching it
    #[arg(long)]
    pub html_file: Option<PathBuf>,

    /// SQLite database file for the upsert sink
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Do not write to the SQLite store
    #[arg(long)]
    pub no_store: bool,

    /// Sink whose failure should fail the run (repeatable)
    #[arg(long = "require", value_enum)]
    pub required: Vec<SinkKind>,

    /// Do not print the news listing to stdout
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Fold command-line values into settings loaded from defaults or file.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(dir) = &self.output_dir {
            settings.output.dir = dir.clone();
        }
        if let Some(skip) = self.skip {
            settings.extract.skip_leading = skip;
        }
        if let Some(url) = &self.page_url {
            settings.source.page_url = url.clone();
        }
        if let Some(url) = &self.api_url {
            settings.source.api_url = url.clone();
        }
        if self.username.is_some() {
            settings.source.username = self.username.clone();
        }
        if self.password.is_some() {
            settings.source.password = self.password.clone();
        }
        if let Some(path) = &self.db_path {
            settings.store.path = path.clone();
        }
        if self.no_store {
            settings.store.enabled = false;
        }
        for kind in &self.required {
            if !settings.output.required.contains(kind) {
                settings.output.required.push(*kind);
            }
        }
    }
}
