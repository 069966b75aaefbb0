//! Serializable pipeline configuration.
//!
//! Defaults reproduce the standard run: the first FIRDS file published
//! between 2021-01-17 and 2021-01-19, written to `/tmp/data.csv` and
//! uploaded to `steeleye-de-task-bucket/data.csv` in `me-central-1`.

use crate::error::{EtlError, Result};
use crate::http::HttpConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_FEED_URL: &str = "https://registers.esma.europa.eu/solr/esma_registers_firds_files/select?q=*&fq=publication_date:%5B2021-01-17T00:00:00Z+TO+2021-01-19T23:59:59Z%5D&wt=xml&indent=true&start=0&rows=100";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Solr search URL returning the feed of published files.
    pub feed_url: String,

    /// Which feed entry to download; negative counts from the end.
    pub feed_index: i64,

    /// Local CSV output path.
    pub csv_path: PathBuf,

    pub upload: UploadConfig,

    pub http: HttpConfig,

    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Skip the upload step and keep only the local CSV.
    pub enabled: bool,
    pub bucket: String,
    pub object_name: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Append-only log file.
    pub path: PathBuf,

    /// Minimum level: trace, debug, info, warn or error.
    pub level: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            feed_index: 0,
            csv_path: PathBuf::from("/tmp/data.csv"),
            upload: UploadConfig::default(),
            http: HttpConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bucket: "steeleye-de-task-bucket".to_string(),
            object_name: "data.csv".to_string(),
            region: "me-central-1".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/logs.log"),
            level: "info".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document. Absent keys keep their defaults.
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| EtlError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EtlError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EtlError::Config(e.to_string()))
    }
}
