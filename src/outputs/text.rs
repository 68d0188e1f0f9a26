//! Plain-text output and the console listing.
//!
//! The file holds one `{index}. {news} - {date}` line per record, each
//! followed by a blank line.

use super::{Sink, SinkStatus};
use crate::config::SinkKind;
use crate::errors::SinkError;
use crate::models::NewsRecord;
use std::fs;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Render records in the line-text format.
pub fn render_lines(records: &[NewsRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format!("{}. {} - {}\n\n", record.index, record.news, record.date));
    }
    out
}

/// Render the tab-separated listing printed to stdout after extraction.
pub fn render_listing(records: &[NewsRecord]) -> String {
    if records.is_empty() {
        return "未找到任何新闻。\n".to_string();
    }
    let mut out = String::from("序号\t新闻\t日期\n");
    out.push_str(&"-".repeat(120));
    out.push('\n');
    for record in records {
        out.push_str(&format!("{}\t{}\t{}\n", record.index, record.news, record.date));
    }
    out
}

#[derive(Debug, Clone)]
pub struct TextSink {
    path: PathBuf,
}

impl TextSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Sink for TextSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Text
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    fn write(&self, records: &[NewsRecord]) -> Result<SinkStatus, SinkError> {
        if records.is_empty() {
            info!("No records; text file not written");
            return Ok(SinkStatus::Skipped);
        }
        fs::write(&self.path, render_lines(records))?;
        info!(rows = records.len(), "Wrote text file");
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
    fn test_render_lines_format() {
        let text = render_lines(&sample_records()[..2]);
        assert_eq!(text, "1. A - 3月5日\n\n2. B, with \"quotes\" - 3月6日\n\n");
    }

    #[test]
    fn test_render_listing() {
        let listing = render_listing(&sample_records());
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines[0], "序号\t新闻\t日期");
        assert_eq!(lines[2], "1\tA\t3月5日");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_render_listing_empty() {
        assert_eq!(render_listing(&[]), "未找到任何新闻。\n");
    }

    #[test]
    fn test_write_and_skip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wiki_news.txt");
        let sink = TextSink::new(path.clone());

        assert_eq!(sink.write(&[]).unwrap(), SinkStatus::Skipped);
        assert!(!path.exists());

        let status = sink.write(&sample_records()).unwrap();
        assert!(matches!(status, SinkStatus::Written { rows: 3, .. }));
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("3. 嫦娥七号发射成功 - 3月6日\n\n"));
    }
}
