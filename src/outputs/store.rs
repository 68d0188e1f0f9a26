//! SQLite upsert sink.
//!
//! Records are keyed on `index`. A run inserts new indices and overwrites
//! `news`/`date` of existing ones; rows whose index is not in the batch are
//! left alone. Re-running with the same batch leaves the table unchanged.

use super::{Sink, SinkStatus};
use crate::config::SinkKind;
use crate::errors::{ConfigError, SinkError};
use crate::models::NewsRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, params};
use std::path::PathBuf;
use tracing::{debug, info, instrument};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex compiles"));

#[derive(Debug, Clone)]
pub struct SqliteSink {
    path: PathBuf,
    table: String,
}

impl SqliteSink {
    /// `table` is interpolated into SQL, so only plain identifiers are accepted.
    pub fn new(path: PathBuf, table: &str) -> Result<Self, ConfigError> {
        if !IDENTIFIER.is_match(table) {
            return Err(ConfigError::TableName(table.to_string()));
        }
        Ok(Self {
            path,
            table: table.to_string(),
        })
    }

    pub fn init_schema(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                "index" INTEGER PRIMARY KEY,
                news    TEXT NOT NULL,
                date    VARCHAR(50) NOT NULL
            );
            "#,
            table = self.table
        ))
    }

    /// Upsert `records` in one transaction. Returns the number of rows touched.
    pub fn upsert(&self, conn: &Connection, records: &[NewsRecord]) -> rusqlite::Result<usize> {
        let tx = conn.unchecked_transaction()?;
        let mut touched = 0;
        {
            let mut stmt = tx.prepare(&format!(
                r#"
                INSERT INTO {table} ("index", news, date)
                VALUES (?1, ?2, ?3)
                ON CONFLICT("index") DO UPDATE SET
                    news = excluded.news,
                    date = excluded.date
                "#,
                table = self.table
            ))?;
            for record in records {
                touched += stmt.execute(params![record.index, record.news, record.date])?;
            }
        }
        tx.commit()?;
        Ok(touched)
    }
}

impl Sink for SqliteSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Store
    }

    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), table = %self.table))]
    fn write(&self, records: &[NewsRecord]) -> Result<SinkStatus, SinkError> {
        if records.is_empty() {
            info!("No records; store not touched");
            return Ok(SinkStatus::Skipped);
        }
        // Connection is dropped, and closed, on every return path below.
        let conn = Connection::open(&self.path)?;
        self.init_schema(&conn)?;
        let touched = self.upsert(&conn, records)?;
        debug!(touched, "Upsert statements applied");
        info!(rows = records.len(), "Upserted records into store");
        Ok(SinkStatus::Written {
            target: format!("{}#{}", self.path.display(), self.table),
            rows: records.len(),
        })
    }
}
