//! Archive fetcher: downloads a published ZIP and pulls instrument records
//! out of the single XML document inside it.

use crate::error::{EtlError, Result};
use crate::xml::{self, Element};
use std::io::{BufReader, Cursor};
use tracing::{error, info, instrument};
use zip::ZipArchive;

/// Element name of one instrument record.
pub const RECORD_TAG: &str = "FinInstrm";

/// Unpack the first entry of an in-memory ZIP and collect elements named `tag`.
///
/// An empty match list is a valid result.
pub fn unpack_records(bytes: &[u8], tag: &str) -> Result<Vec<Element>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| EtlError::MalformedArchive(e.to_string()))?;
    if archive.is_empty() {
        return Err(EtlError::MalformedArchive("archive has no entries".into()));
    }

    let entry = archive
        .by_index(0)
        .map_err(|e| EtlError::MalformedArchive(e.to_string()))?;
    info!(entry = entry.name(), size = entry.size(), "unpacking archive entry");

    // Inflate and CRC failures surface as read errors from inside the XML reader.
    xml::collect_elements(BufReader::with_capacity(1024 * 1024, entry), tag).map_err(|e| match e {
        EtlError::Io(io) => EtlError::MalformedArchive(io.to_string()),
        other => other,
    })
}

/// Downloads archives and extracts their instrument records.
pub struct ArchiveFetcher {
    client: reqwest::blocking::Client,
}

impl ArchiveFetcher {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    /// Download the archive at `url` and return its `FinInstrm` records.
    ///
    /// The response status is not checked up front: an error page is simply
    /// not a ZIP and is reported as a malformed archive.
    #[instrument(name = "fetch_archive_records", skip(self))]
    pub fn fetch_records(&self, url: &str) -> Result<Vec<Element>> {
        let resp = self.client.get(url).send().map_err(|e| {
            error!("archive request failed: {e}");
            EtlError::from(e)
        })?;
        let status = resp.status();
        let bytes = resp.bytes().map_err(|e| {
            error!("failed to read archive body: {e}");
            EtlError::from(e)
        })?;
        info!(bytes = bytes.len(), status = status.as_u16(), "downloaded archive");

        let records = unpack_records(&bytes, RECORD_TAG).map_err(|e| {
            let e = match e {
                EtlError::MalformedArchive(msg) if !status.is_success() => {
                    EtlError::MalformedArchive(format!("HTTP {status}: {msg}"))
                }
                other => other,
            };
            error!("failed to unpack archive: {e}");
            e
        })?;

        info!("found {} elements", records.len());
        Ok(records)
    }
}
