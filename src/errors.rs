//! Error types for configuration, fetching, extraction and sinks.
//!
//! Only [`ConfigError`] and [`FetchError`] are fatal to a run. A
//! [`StructuralMiss`] costs one date and a [`SinkError`] costs one sink; both
//! are logged and reported, never propagated past their stage.

use std::io;

use thiserror::Error;

/// Invalid settings detected before any network or file work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid selector for {field}: {reason}")]
    Selector { field: &'static str, reason: String },
    #[error("invalid heading pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("invalid table name '{0}': expected a plain SQL identifier")]
    TableName(String),
}

/// Failure reaching the page. Aborts the run before extraction.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered with http status {status}")]
    Status { url: String, status: u16 },
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected api response: {0}")]
    Api(String),
    #[error("login rejected: result={result}, reason={reason}")]
    LoginRejected { result: String, reason: String },
    #[error("failed to read local page '{path}': {source}")]
    LocalFile { path: String, source: io::Error },
}

/// A date section whose list could not be located.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralMiss {
    #[error("heading is not inside a heading-group container")]
    MissingContainer,
    #[error("no excerpt block follows the heading group")]
    MissingExcerpt,
    #[error("excerpt block holds no list")]
    MissingList,
}

/// Failure inside a single output sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("xlsx write failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("sink task aborted: {0}")]
    Aborted(String),
}
