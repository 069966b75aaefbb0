//! Blocking HTTP client shared by the locator and the archive fetcher.

use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const USER_AGENT: &str = concat!("firds-etl/", env!("CARGO_PKG_VERSION"));

/// HTTP settings.
///
/// With no timeout a stalled server blocks the run indefinitely; set one when
/// running unattended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

pub fn build_client(config: &HttpConfig) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout_secs.map(Duration::from_secs))
        .build()
        .map_err(|e| EtlError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))
}
