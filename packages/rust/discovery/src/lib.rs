//! Lab link discovery.
//!
//! Fetches the lab index page once and collects the absolute URL of every lab
//! it links to. A failed index fetch aborts the whole run, so every error here
//! is returned to the caller rather than logged and swallowed.

use labbook_shared::{LabbookError, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Anchors inside a lab-link widget on the index page.
pub const LAB_LINK_SELECTOR: &str = ".widgetcontainer-lab-link a";

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Fetch the index page and return every lab URL, in document order.
///
/// Duplicates are kept; `base` is the origin each `href` is resolved against.
#[instrument(skip_all, fields(index = %index_url))]
pub async fn discover_labs(client: &Client, index_url: &Url, base: &Url) -> Result<Vec<Url>> {
    let body = fetch_index(client, index_url).await?;
    let doc = Html::parse_document(&body);
    let links = extract_lab_links(&doc, base)?;

    info!(count = links.len(), "lab links discovered");

    Ok(links)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// GET the index page, failing on transport errors and non-success statuses.
async fn fetch_index(client: &Client, url: &Url) -> Result<String> {
    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| LabbookError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LabbookError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| LabbookError::Network(format!("{url}: failed to read body: {e}")))
}

/// Collect lab links from a parsed index page, resolved against `base`.
pub fn extract_lab_links(doc: &Html, base: &Url) -> Result<Vec<Url>> {
    let selector = Selector::parse(LAB_LINK_SELECTOR)
        .map_err(|e| LabbookError::parse(format!("bad selector {LAB_LINK_SELECTOR}: {e}")))?;

    let mut links = Vec::new();
    for anchor in doc.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            warn!("lab link without href, skipping");
            continue;
        };

        let url = base
            .join(href)
            .map_err(|e| LabbookError::parse(format!("unresolvable lab link '{href}': {e}")))?;
        debug!(%url, "lab link");
        links.push(url);
    }

    Ok(links)
}
