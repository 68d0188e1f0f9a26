//! Run configuration.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! command-line overrides (see [`crate::cli::Cli::apply_overrides`]). Every
//! section uses `#[serde(default)]` so a config file only needs the keys it
//! changes:
//!
//! ```yaml
//! extract:
//!   skip_leading: 2
//! output:
//!   dir: ./archive
//!   required: [json, store]
//! store:
//!   path: ./archive/news.db
//! ```

use crate::errors::ConfigError;
use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const DEFAULT_API_URL: &str = "https://zh.wikipedia.org/w/api.php";
pub const DEFAULT_PAGE_URL: &str = "https://zh.m.wikipedia.org/wiki/Portal:新闻动态";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// The five output sinks, as named in config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Text,
    Json,
    Csv,
    Xlsx,
    Store,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Text => "text",
            SinkKind::Json => "json",
            SinkKind::Csv => "csv",
            SinkKind::Xlsx => "xlsx",
            SinkKind::Store => "store",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub extract: ExtractSettings,
    pub output: OutputSettings,
    pub store: StoreSettings,
}

/// Where and how the page is fetched.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// MediaWiki `api.php` endpoint used for the bot-password login.
    pub api_url: String,
    /// The news portal page to scrape.
    pub page_url: String,
    /// Bot-password user name (`Account@BotName`). Anonymous fetch when unset.
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Retries for the page request after the first attempt.
    pub max_retries: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_url: DEFAULT_PAGE_URL.to_string(),
            username: None,
            password: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 20,
            max_retries: 3,
        }
    }
}

/// Markup conventions of the portal page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    pub heading_selector: String,
    /// Regex matched against the heading's `id` attribute.
    pub heading_pattern: String,
    /// Number of leading date sections to ignore. The first one is "today".
    pub skip_leading: usize,
    pub container_selector: String,
    pub excerpt_selector: String,
    pub list_selector: String,
    pub citation_selector: String,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            heading_selector: "h2".to_string(),
            heading_pattern: r"^\d+月\d+日$".to_string(),
            skip_leading: 1,
            container_selector: "div.mw-heading.mw-heading2".to_string(),
            excerpt_selector: "div.excerpt-block".to_string(),
            list_selector: "ul, ol".to_string(),
            citation_selector: "sup".to_string(),
        }
    }
}

/// File sink locations and which sinks must succeed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub text_file: String,
    pub json_file: String,
    pub csv_file: String,
    pub xlsx_file: String,
    /// Sinks whose failure makes the process exit non-zero.
    pub required: Vec<SinkKind>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            text_file: "wiki_news.txt".to_string(),
            json_file: "wiki_news.json".to_string(),
            csv_file: "wiki_news.csv".to_string(),
            xlsx_file: "wiki_news.xlsx".to_string(),
            required: Vec::new(),
        }
    }
}

impl OutputSettings {
    pub fn path_for(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn is_required(&self, kind: SinkKind) -> bool {
        self.required.contains(&kind)
    }
}

/// The relational store used by the upsert sink.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub enabled: bool,
    pub path: PathBuf,
    pub table: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("results/wiki_news.db"),
            table: "wiki_news".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file, falling back to defaults for
    /// anything the file leaves out.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!("Loaded configuration file");
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_portal_layout() {
        let settings = Settings::default();
        assert_eq!(settings.extract.skip_leading, 1);
        assert_eq!(settings.extract.heading_pattern, r"^\d+月\d+日$");
        assert_eq!(
            settings.output.path_for(&settings.output.json_file),
            PathBuf::from("results/wiki_news.json")
        );
        assert!(settings.store.enabled);
        assert!(settings.output.required.is_empty());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
extract:
  skip_leading: 2
output:
  dir: /tmp/archive
  required: [json, store]
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.extract.skip_leading, 2);
        assert_eq!(settings.extract.citation_selector, "sup");
        assert_eq!(settings.output.dir, PathBuf::from("/tmp/archive"));
        assert!(settings.output.is_required(SinkKind::Json));
        assert!(settings.output.is_required(SinkKind::Store));
        assert!(!settings.output.is_required(SinkKind::Csv));
        assert_eq!(settings.store.table, "wiki_news");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let settings = Settings::from_yaml("  \n").unwrap();
        assert_eq!(settings.source.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_unknown_sink_name_is_rejected() {
        let yaml = "output:\n  required: [parquet]\n";
        assert!(Settings::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Settings::from_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }
}
