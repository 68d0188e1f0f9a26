//! JSON output.
//!
//! The batch is written as one array of `{index, news, date}` objects with
//! four-space indentation. serde_json leaves non-ASCII text unescaped, so
//! Chinese news stays readable in the file.

use super::{Sink, SinkStatus};
use crate::config::SinkKind;
use crate::errors::SinkError;
use crate::models::NewsRecord;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Serialize records as an indented JSON array.
pub fn to_pretty_json(records: &[NewsRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    Ok(buf)
}

#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Sink for JsonSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Json
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    fn write(&self, records: &[NewsRecord]) -> Result<SinkStatus, SinkError> {
        if records.is_empty() {
            info!("No records; JSON file not written");
            return Ok(SinkStatus::Skipped);
        }
        let json = to_pretty_json(records)?;
        fs::write(&self.path, json)?;
        info!(rows = records.len(), "Wrote JSON file");
        Ok(SinkStatus::Written {
            target: self.path.display().to_string(),
            rows: records.len(),
        })
    }
}
