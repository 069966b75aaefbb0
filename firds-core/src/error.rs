//! Structured error types for pipeline operations.
//!
//! Every stage returns `Result<_, EtlError>`. Nothing is recovered locally:
//! the first error aborts the run and is surfaced by the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds across the four pipeline stages.
///
/// These are designed to be displayable directly in CLI output and logs.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("index {index} out of range for feed with {len} documents")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("feed document {index} has no download link")]
    MissingLink { index: usize },

    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("record {record} is missing field '{field}'")]
    MissingField { record: usize, field: &'static str },

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("object storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EtlError {
    /// True for failures to reach the remote host or a 4xx/5xx status.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            EtlError::NetworkUnreachable(_) | EtlError::HttpStatus { .. }
        )
    }
}

impl From<reqwest::Error> for EtlError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return EtlError::HttpStatus {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        EtlError::NetworkUnreachable(e.to_string())
    }
}

impl From<quick_xml::Error> for EtlError {
    fn from(e: quick_xml::Error) -> Self {
        match e {
            quick_xml::Error::Io(io) => EtlError::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => EtlError::MalformedXml(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
