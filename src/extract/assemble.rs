//! Turn per-date item groups into globally indexed records.

use crate::models::{DaySection, NewsRecord};
use tracing::{debug, info};

/// Flatten `sections` into records numbered `1..=n` in the order given.
///
/// The counter runs across all dates. Sections without items are dropped
/// and consume no index.
pub fn assemble(sections: impl IntoIterator<Item = DaySection>) -> Vec<NewsRecord> {
    let mut records = Vec::new();
    let mut kept_days = 0usize;

    for section in sections {
        if section.items.is_empty() {
            info!(date = %section.date, "No valid news for date; omitting it");
            continue;
        }
        kept_days += 1;
        debug!(date = %section.date, items = section.items.len(), "Assembling date");
        for news in section.items {
            records.push(NewsRecord {
                index: records.len() as u32 + 1,
                news,
                date: section.date.clone(),
            });
        }
    }

    info!(records = records.len(), days = kept_days, "Assembled news records");
    records
}
