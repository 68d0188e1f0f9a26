//! Output sinks for the extracted news records.
//!
//! Every sink receives the same immutable record slice and writes it in its
//! own format. Sinks share nothing else, so [`write_all`] runs them side by
//! side on the blocking pool and collects one [`SinkReport`] per sink. A
//! failing sink never stops the others.
//!
//! # Submodules
//!
//! - [`text`]: `1. news - date` lines, plus the stdout listing
//! - [`json`]: Pretty-printed JSON array
//! - [`table`]: CSV with a UTF-8 byte-order mark
//! - [`spreadsheet`]: Single-sheet XLSX workbook
//! - [`store`]: SQLite table upserted on `index`
//!
//! # Output Structure
//!
//! ```text
//! results/
//! ├── wiki_news.txt
//! ├── wiki_news.json
//! ├── wiki_news.csv
//! ├── wiki_news.xlsx
//! └── wiki_news.db      # default store location
//! ```

pub mod json;
pub mod spreadsheet;
pub mod store;
pub mod table;
pub mod text;

use crate::config::{Settings, SinkKind};
use crate::errors::{ConfigError, SinkError};
use crate::models::NewsRecord;
use futures::future::join_all;
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// What a sink did with the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkStatus {
    /// `rows` records written to `target`.
    Written { target: String, rows: usize },
    /// Nothing to write.
    Skipped,
}

/// A destination for the full record batch.
pub trait Sink: Send + Sync {
    fn kind(&self) -> SinkKind;

    /// Write the whole batch. Implementations must treat an empty batch as a
    /// no-op and return [`SinkStatus::Skipped`].
    fn write(&self, records: &[NewsRecord]) -> Result<SinkStatus, SinkError>;
}

/// A sink plus the run policy attached to it.
pub struct ConfiguredSink {
    pub sink: Box<dyn Sink>,
    pub required: bool,
}

impl fmt::Debug for ConfiguredSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredSink")
            .field("kind", &self.sink.kind())
            .field("required", &self.required)
            .finish()
    }
}

/// Outcome of one sink.
#[derive(Debug)]
pub struct SinkReport {
    pub kind: SinkKind,
    pub required: bool,
    pub result: Result<SinkStatus, SinkError>,
}

/// Outcomes of every sink in the run, in configuration order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub sinks: Vec<SinkReport>,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &SinkReport> {
        self.sinks.iter().filter(|r| r.result.is_err())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &SinkReport> {
        self.sinks.iter().filter(|r| r.result.is_ok())
    }

    /// True when any sink marked as required failed.
    pub fn has_required_failure(&self) -> bool {
        self.failed().any(|r| r.required)
    }

    #[cfg(test)]
    pub fn get(&self, kind: SinkKind) -> Option<&SinkReport> {
        self.sinks.iter().find(|r| r.kind == kind)
    }

    /// One-line summary such as `ok: text, json | failed: store`.
    pub fn summary(&self) -> String {
        let ok = self.succeeded().map(|r| r.kind).join(", ");
        let failed = self.failed().map(|r| r.kind).join(", ");
        if failed.is_empty() {
            format!("ok: {ok}")
        } else {
            format!("ok: {ok} | failed: {failed}")
        }
    }
}

/// Build the configured sinks in their fixed order: text, json, csv, xlsx,
/// then the store when enabled.
pub fn build_sinks(settings: &Settings) -> Result<Vec<ConfiguredSink>, ConfigError> {
    let output = &settings.output;
    let mut sinks: Vec<Box<dyn Sink>> = vec![
        Box::new(text::TextSink::new(output.path_for(&output.text_file))),
        Box::new(json::JsonSink::new(output.path_for(&output.json_file))),
        Box::new(table::CsvSink::new(output.path_for(&output.csv_file))),
        Box::new(spreadsheet::XlsxSink::new(output.path_for(&output.xlsx_file))),
    ];
    if settings.store.enabled {
        sinks.push(Box::new(store::SqliteSink::new(
            settings.store.path.clone(),
            &settings.store.table,
        )?));
    }

    Ok(sinks
        .into_iter()
        .map(|sink| {
            let required = output.is_required(sink.kind());
            ConfiguredSink { sink, required }
        })
        .collect())
}

/// Run every sink against `records` concurrently and report each outcome.
#[instrument(level = "info", skip_all, fields(sinks = sinks.len(), records = records.len()))]
pub async fn write_all(sinks: Vec<ConfiguredSink>, records: Arc<[NewsRecord]>) -> RunReport {
    let tasks = sinks.into_iter().map(|configured| {
        let records = Arc::clone(&records);
        let kind = configured.sink.kind();
        let required = configured.required;
        async move {
            let handle =
                tokio::task::spawn_blocking(move || configured.sink.write(&records));
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(SinkError::Aborted(e.to_string())),
            };
            match &result {
                Ok(SinkStatus::Written { target, rows }) => {
                    info!(sink = %kind, %target, rows, "Sink completed")
                }
                Ok(SinkStatus::Skipped) => warn!(sink = %kind, "Sink skipped: no records"),
                Err(e) => error!(sink = %kind, required, error = %e, "Sink failed"),
            }
            SinkReport {
                kind,
                required,
                result,
            }
        }
    });

    let report = RunReport {
        sinks: join_all(tasks).await,
    };
    info!(summary = %report.summary(), "All sinks finished");
    report
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::NewsRecord;

    pub fn sample_records() -> Vec<NewsRecord> {
        vec![
            NewsRecord {
                index: 1,
                news: "A".to_string(),
                date: "3月5日".to_string(),
            },
            NewsRecord {
                index: 2,
                news: "B, with \"quotes\"".to_string(),
                date: "3月6日".to_string(),
            },
            NewsRecord {
                index: 3,
                news: "嫦娥七号发射成功".to_string(),
                date: "3月6日".to_string(),
            },
        ]
    }
}
