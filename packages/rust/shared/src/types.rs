//! Domain types passed between the pipeline stages.

use std::path::{Path, PathBuf};

/// Token in the template that receives the assembled body.
pub const TEMPLATE_PLACEHOLDER: &str = "{{ content }}";

// ---------------------------------------------------------------------------
// ArchivedPage
// ---------------------------------------------------------------------------

/// A lab page persisted to the download directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedPage {
    /// URL the page was fetched from.
    pub url: String,
    /// Where the raw body was written.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes: usize,
}

impl ArchivedPage {
    /// File name without directory, e.g. `001-sql-injection.html`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name with the extension stripped, used to tag each fragment's heading.
    pub fn label(&self) -> String {
        label_for(&self.path)
    }
}

/// Label for an archived file: its file stem.
pub fn label_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// PageOutcome
// ---------------------------------------------------------------------------

/// Result of archiving one discovered URL.
///
/// A failed fetch is not an error: the page is skipped and the batch goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The body was fetched and written to disk.
    Archived(ArchivedPage),
    /// The fetch failed or returned a non-success status.
    Failed {
        /// URL that could not be archived.
        url: String,
        /// Human-readable reason, e.g. `HTTP 404 Not Found`.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// ContentFragment
// ---------------------------------------------------------------------------

/// One extracted, filtered and rewritten lab section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFragment {
    /// Label of the archived page the section came from.
    pub label: String,
    /// Formatted HTML of the section.
    pub html: String,
}
