//! Extraction engine for the news portal page.
//!
//! The page lists one section per day, newest first. Extraction runs in four
//! steps, each in its own submodule:
//!
//! 1. [`headings`]: find date headings by their `id` and drop the leading
//!    "today" section(s)
//! 2. [`sections`]: walk from each heading to the list of items for that day
//! 3. [`normalize`]: strip citations and reduce each item to plain text
//! 4. [`assemble`]: number the surviving items across the whole page
//!
//! Missing structure and empty items are logged and skipped; extraction
//! itself never fails once its options are built.

pub mod assemble;
pub mod headings;
pub mod normalize;
pub mod sections;

use crate::config::ExtractSettings;
use crate::errors::{ConfigError, StructuralMiss};
use crate::models::{DaySection, NewsRecord};
use crate::utils::truncate_for_log;
use headings::{DatePattern, locate_headings};
use normalize::normalize_item;
use scraper::{Html, Selector};
use sections::Markup;
use tracing::{debug, info, instrument, warn};

/// Compiled extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub pattern: DatePattern,
    pub skip_leading: usize,
    pub markup: Markup,
}

impl ExtractOptions {
    /// Compile selectors and the heading pattern, rejecting invalid ones.
    pub fn from_settings(settings: &ExtractSettings) -> Result<Self, ConfigError> {
        let pattern =
            DatePattern::new(&settings.heading_pattern).map_err(|source| ConfigError::Pattern {
                pattern: settings.heading_pattern.clone(),
                source,
            })?;

        Ok(Self {
            pattern,
            skip_leading: settings.skip_leading,
            markup: Markup {
                heading: selector("heading_selector", &settings.heading_selector)?,
                container: selector("container_selector", &settings.container_selector)?,
                excerpt: selector("excerpt_selector", &settings.excerpt_selector)?,
                list: selector("list_selector", &settings.list_selector)?,
                citation: selector("citation_selector", &settings.citation_selector)?,
            },
        })
    }
}

fn selector(field: &'static str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::Selector {
        field,
        reason: format!("'{css}': {e}"),
    })
}

/// Per-date item groups for every retained heading, in document order.
///
/// Dates whose list cannot be located come back with no items.
#[instrument(level = "info", skip_all, fields(bytes = html.len()))]
pub fn extract_sections(html: &str, options: &ExtractOptions) -> Vec<DaySection> {
    let document = Html::parse_document(html);
    let markup = &options.markup;
    let headings = locate_headings(
        &document,
        &markup.heading,
        &options.pattern,
        options.skip_leading,
    );

    headings
        .into_iter()
        .map(|heading| {
            let date = heading.label;
            let list_items = match markup.list_items(heading.element) {
                Ok(list_items) => list_items,
                Err(miss @ StructuralMiss::MissingList) => {
                    info!(%date, reason = %miss, "No news list for date; skipping");
                    Vec::new()
                }
                Err(miss) => {
                    warn!(%date, reason = %miss, "Could not locate news for date; skipping");
                    Vec::new()
                }
            };

            let mut items = Vec::with_capacity(list_items.len());
            for (position, li) in list_items.into_iter().enumerate() {
                match normalize_item(li, &markup.citation) {
                    Some(text) => {
                        debug!(%date, position, news = %truncate_for_log(&text, 80), "Kept item");
                        items.push(text);
                    }
                    None => info!(%date, position, "Empty news item after cleaning; dropped"),
                }
            }
            DaySection::new(date, items)
        })
        .collect()
}

/// Extract the numbered news records from a portal page.
pub fn extract_news(html: &str, options: &ExtractOptions) -> Vec<NewsRecord> {
    assemble::assemble(extract_sections(html, options))
}
