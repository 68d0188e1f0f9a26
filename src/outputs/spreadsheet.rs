//! XLSX output: one sheet, a bold header row, then one row per record.

use super::{Sink, SinkStatus};
use crate::config::SinkKind;
use crate::errors::SinkError;
use crate::models::NewsRecord;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::PathBuf;
use tracing::{info, instrument};

const SHEET_NAME: &str = "wiki_news";
const HEADERS: [&str; 3] = ["index", "news", "date"];

/// Lay the records out in a new workbook.
pub fn build_workbook(records: &[NewsRecord]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, record.index)?;
        sheet.write_string(row, 1, &record.news)?;
        sheet.write_string(row, 2, &record.date)?;
    }
    sheet.set_column_width(1, 80)?;
    sheet.set_column_width(2, 12)?;

    Ok(workbook)
}

#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Sink for XlsxSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Xlsx
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    fn write(&self, records: &[NewsRecord]) -> Result<SinkStatus, SinkError> {
        if records.is_empty() {
            info!("No records; spreadsheet not written");
            return Ok(SinkStatus::Skipped);
        }
        let mut workbook = build_workbook(records)?;
        workbook.save(&self.path)?;
        info!(rows = records.len(), "Wrote spreadsheet");
        Ok(SinkStatus::Written {
            target: self.path.display().to_string(),
            rows: records.len(),
        })
    }
}
