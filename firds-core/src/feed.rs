//! Feed locator: finds the n-th archive link in a Solr search-result feed.
//!
//! The feed is an XML `<response>` whose `<doc>` entries each describe one
//! published file. The link is looked up by its Solr field name
//! (`<str name="download_link">`). Older consumers relied on the link being
//! the fourth child node of the indented feed; that position is kept only as a
//! fallback for entries without the named field.

use crate::error::{EtlError, Result};
use crate::xml::{self, Element, Node};
use tracing::{error, info, instrument};

/// Element name of one feed entry.
pub const DOC_TAG: &str = "doc";

/// Solr field holding the archive URL.
pub const LINK_FIELD: &str = "download_link";

/// Position of the link among a `<doc>`'s child nodes in the indented feed.
const LINK_NODE_POSITION: usize = 3;

/// Map a possibly negative index onto `0..len`.
///
/// Negative indices count back from the end, so `-1` is the last entry.
pub fn resolve_index(index: i64, len: usize) -> Result<usize> {
    let out_of_range = || EtlError::IndexOutOfRange { index, len };
    let resolved = if index < 0 {
        (len as i64).checked_add(index).ok_or_else(out_of_range)?
    } else {
        index
    };
    if resolved < 0 || resolved >= len as i64 {
        return Err(out_of_range());
    }
    Ok(resolved as usize)
}

/// Extract the download link from one feed entry.
pub fn doc_link(doc: &Element) -> Option<String> {
    let named = doc
        .child_elements()
        .find(|e| e.attribute("name") == Some(LINK_FIELD));
    let positional = || {
        doc.node(LINK_NODE_POSITION)
            .and_then(Node::as_element)
            .or_else(|| doc.child_element(1))
    };

    named
        .or_else(positional)
        .map(|e| e.text().trim().to_string())
        .filter(|link| !link.is_empty())
}

/// All download links in the feed, in document order.
pub fn feed_links(feed_xml: &str) -> Result<Vec<Option<String>>> {
    let root = xml::parse_document(feed_xml)?;
    Ok(root.find_all(DOC_TAG).into_iter().map(doc_link).collect())
}

/// Select the link of the entry at `index` from a feed document.
pub fn select_link(feed_xml: &str, index: i64) -> Result<String> {
    let root = xml::parse_document(feed_xml)?;
    let docs = root.find_all(DOC_TAG);
    let position = resolve_index(index, docs.len())?;
    doc_link(docs[position]).ok_or(EtlError::MissingLink { index: position })
}

/// Fetches the search feed and picks an archive link out of it.
pub struct FeedLocator {
    client: reqwest::blocking::Client,
}

impl FeedLocator {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    /// Download the feed at `url` and return the link of entry `index`.
    #[instrument(name = "locate_archive_link", skip(self))]
    pub fn locate(&self, url: &str, index: i64) -> Result<String> {
        let body = self.download(url)?;
        info!("downloaded feed, parsing for archive link");

        match select_link(&body, index) {
            Ok(link) => {
                info!(%link, "found archive link");
                Ok(link)
            }
            Err(e) => {
                error!("failed to find a valid archive link for index {index}: {e}");
                Err(e)
            }
        }
    }

    fn download(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().map_err(|e| {
            error!("feed request failed: {e}");
            EtlError::from(e)
        })?;

        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            error!(status = status.as_u16(), "can't download feed");
            return Err(EtlError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.text().map_err(|e| {
            error!("failed to read feed body: {e}");
            EtlError::from(e)
        })
    }
}
