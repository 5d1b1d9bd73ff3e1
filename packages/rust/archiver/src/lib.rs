//! Lab page archiving.
//!
//! Fetches each discovered lab URL and writes the raw response body, byte for
//! byte, to a uniquely named file in the download directory. A page that
//! cannot be fetched is reported as [`PageOutcome::Failed`] and skipped;
//! filesystem errors are returned as `Err` and end the run.

pub mod naming;

use std::io::Write;
use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use labbook_shared::{ArchivedPage, LabbookError, PageOutcome, Result};

pub use naming::{file_name_for, slug_for, unique_path};

// ---------------------------------------------------------------------------
// Archiver
// ---------------------------------------------------------------------------

/// Writes fetched lab pages into a download directory.
pub struct Archiver {
    client: Client,
    download_dir: PathBuf,
}

impl Archiver {
    /// Create an archiver, creating `download_dir` if it does not exist.
    pub fn new(client: Client, download_dir: impl Into<PathBuf>) -> Result<Self> {
        let download_dir = download_dir.into();
        std::fs::create_dir_all(&download_dir)
            .map_err(|e| LabbookError::io(&download_dir, e))?;

        Ok(Self {
            client,
            download_dir,
        })
    }

    /// Directory archived pages are written to.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Fetch and persist the `index`-th (1-based) discovered URL.
    ///
    /// Transport errors and non-success statuses yield [`PageOutcome::Failed`];
    /// no file is written for them and the page is not retried.
    #[instrument(skip_all, fields(index = index, url = %url))]
    pub async fn archive_page(&self, index: usize, url: &Url) -> Result<PageOutcome> {
        let body = match fetch_body(&self.client, url).await {
            Ok(body) => body,
            Err(reason) => {
                warn!(%reason, "fetch failed, skipping");
                return Ok(PageOutcome::Failed {
                    url: url.to_string(),
                    reason,
                });
            }
        };

        let file_name = file_name_for(index, url.as_str());
        let path = unique_path(&self.download_dir, &file_name);
        write_new(&path, &body)?;

        let page = ArchivedPage {
            url: url.to_string(),
            path,
            bytes: body.len(),
        };
        info!(file = %page.file_name(), bytes = page.bytes, "page archived");

        Ok(PageOutcome::Archived(page))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// GET a page and return its raw body; the error is a reason for the log.
async fn fetch_body(client: &Client, url: &Url) -> std::result::Result<Vec<u8>, String> {
    debug!("fetching page");

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {status}"));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| format!("body read failed: {e}"))?;

    Ok(body.to_vec())
}

/// Write `bytes` to `path`, refusing to replace an existing file.
fn write_new(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| LabbookError::io(path, e))?;

    file.write_all(bytes).map_err(|e| LabbookError::io(path, e))
}
