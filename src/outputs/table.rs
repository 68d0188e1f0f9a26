//! CSV output.
//!
//! The file starts with a UTF-8 byte-order mark. Excel otherwise opens
//! UTF-8 CSV as the local ANSI code page and mangles Chinese text.

use super::{Sink, SinkStatus};
use crate::config::SinkKind;
use crate::errors::SinkError;
use crate::models::NewsRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, instrument};

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write BOM, `index,news,date` header and one row per record to `out`.
pub fn write_csv<W: Write>(mut out: W, records: &[NewsRecord]) -> Result<(), SinkError> {
    out.write_all(UTF8_BOM)?;
    // Header comes from the NewsRecord field names.
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Sink for CsvSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Csv
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    fn write(&self, records: &[NewsRecord]) -> Result<SinkStatus, SinkError> {
        if records.is_empty() {
            info!("No records; CSV file not written");
            return Ok(SinkStatus::Skipped);
        }
        let file = File::create(&self.path)?;
        write_csv(BufWriter::new(file), records)?;
        info!(rows = records.len(), "Wrote CSV file");
        Ok(SinkStatus::Written {
            target: self.path.display().to_string(),
            rows: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::test_support::sample_records;

    #[test]
    fn test_bom_header_and_quoting() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &sample_records()).unwrap();

        assert!(buf.starts_with(UTF8_BOM));
        let body = std::str::from_utf8(&buf[UTF8_BOM.len()..]).unwrap();
        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines[0], "index,news,date");
        assert_eq!(lines[1], "1,A,3月5日");
        assert_eq!(lines[2], "2,\"B, with \"\"quotes\"\"\",3月6日");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wiki_news.csv");
        CsvSink::new(path.clone()).write(&sample_records()).unwrap();

        let raw = std::fs::read(&path).unwrap();
        let mut reader = csv::Reader::from_reader(&raw[UTF8_BOM.len()..]);
        let rows: Vec<NewsRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, sample_records());
    }

    #[test]
    fn test_empty_batch_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wiki_news.csv");
        assert_eq!(CsvSink::new(path.clone()).write(&[]).unwrap(), SinkStatus::Skipped);
        assert!(!path.exists());
    }
}
