//! Archive file naming.
//!
//! Files are named `NNN-<slug>.html`, where `NNN` is the 1-based position of
//! the URL in discovery order and `<slug>` its last path segment. When a name
//! is already taken, `_1`, `_2`, ... is inserted before the extension.

use std::path::{Path, PathBuf};

/// Last path segment of a URL, ignoring trailing slashes.
pub fn slug_for(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

/// Archive file name for the `index`-th discovered URL.
pub fn file_name_for(index: usize, url: &str) -> String {
    format!("{index:03}-{}.html", slug_for(url))
}

/// First path in `dir` for `file_name` that does not exist yet.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    if !path.exists() {
        return path;
    }

    let candidate = Path::new(file_name);
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = candidate
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|i| dir.join(format!("{stem}_{i}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(path)
}
