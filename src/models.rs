//! Data models for extracted news records.
//!
//! This module defines the structures passed between the extraction engine
//! and the output sinks:
//! - [`DaySection`]: Normalized items found under one date heading
//! - [`NewsRecord`]: A single indexed news item, the only thing sinks see
//!
//! Field order on [`NewsRecord`] is `index, news, date`. Serde keeps
//! declaration order, so the JSON, CSV and spreadsheet outputs all share it.

use serde::{Deserialize, Serialize};

/// Normalized news items collected under a single date heading.
///
/// Produced by the section extractor before any indices are assigned. A
/// section with no items is legal here; the assembler drops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySection {
    /// Visible text of the date heading, e.g. `3月5日`.
    pub date: String,
    /// Cleaned item texts in list order. Never contains empty strings.
    pub items: Vec<String>,
}

impl DaySection {
    pub fn new(date: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            date: date.into(),
            items,
        }
    }
}

/// One news item with its global running index.
///
/// # Fields
///
/// * `index` - 1-based position across the whole run, unique and gap-free
/// * `news` - Plain text with citation markers removed
/// * `date` - The heading label, kept verbatim as a display string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsRecord {
    pub index: u32,
    pub news: String,
    pub date: String,
}
