//! Combined document assembler.
//!
//! Extracts the fragments of every archived page, joins them with `<hr>`
//! separators and substitutes the result into the template.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use labbook_extract::extract_file;
use labbook_shared::{ContentFragment, LabbookError, Result, TEMPLATE_PLACEHOLDER};

/// Separator emitted after every fragment.
pub const SEPARATOR: &str = "<hr>";

/// Output from a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleResult {
    /// Where the combined document was written.
    pub output_path: PathBuf,
    /// Archived pages read.
    pub page_count: usize,
    /// Fragments written to the document.
    pub fragment_count: usize,
    /// Sections dropped as expert labs.
    pub expert_skipped: usize,
}

/// Paths the assembler reads from and writes to.
#[derive(Debug, Clone)]
pub struct AssembleConfig {
    /// Origin prepended to root-relative links.
    pub site_origin: String,
    /// Template containing the placeholder.
    pub template_path: PathBuf,
    /// Combined output document, overwritten if present.
    pub output_path: PathBuf,
}

/// Build the combined document from archived pages, in the given order.
#[instrument(skip_all, fields(pages = pages.len(), output = %config.output_path.display()))]
pub fn assemble(config: &AssembleConfig, pages: &[PathBuf]) -> Result<AssembleResult> {
    let mut fragments = Vec::new();
    let mut expert_skipped = 0;

    for path in pages {
        let extract = extract_file(path, &config.site_origin)?;
        debug!(
            file = %path.display(),
            fragments = extract.fragments.len(),
            expert_skipped = extract.expert_skipped,
            "page assembled"
        );
        expert_skipped += extract.expert_skipped;
        fragments.extend(extract.fragments);
    }

    let template = std::fs::read_to_string(&config.template_path)
        .map_err(|e| LabbookError::io(&config.template_path, e))?;
    let document = render_template(&template, &build_body(&fragments))?;
    write_output(&config.output_path, &document)?;

    info!(
        fragment_count = fragments.len(),
        expert_skipped,
        path = %config.output_path.display(),
        "document assembled"
    );

    Ok(AssembleResult {
        output_path: config.output_path.clone(),
        page_count: pages.len(),
        fragment_count: fragments.len(),
        expert_skipped,
    })
}

/// Join fragments, each followed by a separator, with newlines.
pub fn build_body(fragments: &[ContentFragment]) -> String {
    fragments
        .iter()
        .flat_map(|fragment| [fragment.html.as_str(), SEPARATOR])
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace the template placeholder with `body`.
///
/// A template without the placeholder is an error; when it appears more than
/// once only the first occurrence is replaced.
pub fn render_template(template: &str, body: &str) -> Result<String> {
    match template.matches(TEMPLATE_PLACEHOLDER).count() {
        0 => Err(LabbookError::template(format!(
            "placeholder `{TEMPLATE_PLACEHOLDER}` not found"
        ))),
        1 => Ok(template.replacen(TEMPLATE_PLACEHOLDER, body, 1)),
        n => {
            warn!(
                occurrences = n,
                "template placeholder repeated, replacing the first only"
            );
            Ok(template.replacen(TEMPLATE_PLACEHOLDER, body, 1))
        }
    }
}

/// Archived pages already in `download_dir`, in archive order.
///
/// Only `NNN-<slug>.html` files are listed; they sort by their numeric
/// prefix, then by name.
pub fn list_archive(download_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(download_dir).map_err(|e| LabbookError::io(download_dir, e))?;

    let mut pages = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LabbookError::io(download_dir, e))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(position) = archive_position(name) {
            pages.push((position, name.to_string(), path));
        }
    }

    pages.sort();
    Ok(pages.into_iter().map(|(_, _, path)| path).collect())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sequence number of an archive file name, `None` for anything else.
fn archive_position(name: &str) -> Option<usize> {
    let stem = name.strip_suffix(".html")?;
    let (digits, _slug) = stem.split_once('-')?;
    if digits.len() < 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Write the document via a temp file and rename, replacing any previous output.
fn write_output(path: &Path, document: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LabbookError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, document).map_err(|e| LabbookError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| LabbookError::io(path, e))?;

    debug!(path = %path.display(), bytes = document.len(), "wrote output");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lb-assembler-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fragment(html: &str) -> ContentFragment {
        ContentFragment {
            label: "001-x".into(),
            html: html.into(),
        }
    }

    fn make_config(dir: &Path) -> AssembleConfig {
        let template_path = dir.join("ResultTemplate.html");
        std::fs::write(
            &template_path,
            "<html><body>\n{{ content }}\n</body></html>\n",
        )
        .unwrap();
        AssembleConfig {
            site_origin: "https://portswigger.net".into(),
            template_path,
            output_path: dir.join("PortSwiggerAllLabs.html"),
        }
    }

    #[test]
    fn body_interleaves_separators() {
        let body = build_body(&[fragment("<div>a</div>"), fragment("<div>b</div>")]);
        assert_eq!(body, "<div>a</div>\n<hr>\n<div>b</div>\n<hr>");
        assert_eq!(build_body(&[]), "");
    }

    #[test]
    fn template_substitution() {
        let out = render_template("<main>{{ content }}</main>", "BODY").unwrap();
        assert_eq!(out, "<main>BODY</main>");
    }

    #[test]
    fn template_placeholder_missing_is_error() {
        let err = render_template("<main></main>", "BODY").unwrap_err();
        assert!(matches!(err, LabbookError::Template { .. }));
    }

    #[test]
    fn template_repeated_placeholder_first_only() {
        let out = render_template("{{ content }}|{{ content }}", "X").unwrap();
        assert_eq!(out, "X|{{ content }}");
    }

    #[test]
    fn body_is_not_reinterpreted() {
        let out = render_template("[{{ content }}]", "$0 {{ content }}").unwrap();
        assert_eq!(out, "[$0 {{ content }}]");
    }

    #[test]
    fn archive_position_parsing() {
        assert_eq!(archive_position("001-lab.html"), Some(1));
        assert_eq!(archive_position("012-lab_1.html"), Some(12));
        assert_eq!(archive_position("1000-lab.html"), Some(1000));
        assert_eq!(archive_position("01-lab.html"), None);
        assert_eq!(archive_position("abc-lab.html"), None);
        assert_eq!(archive_position("001-lab.txt"), None);
        assert_eq!(archive_position(".001-lab.html.tmp"), None);
    }

    #[test]
    fn list_archive_orders_numerically() {
        let dir = temp_dir();
        for name in ["1000-z.html", "002-b.html", "001-a_1.html", "001-a.html", "notes.txt"] {
            std::fs::write(dir.join(name), "").unwrap();
        }

        let names: Vec<String> = list_archive(&dir)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["001-a.html", "001-a_1.html", "002-b.html", "1000-z.html"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn assemble_writes_document() {
        let dir = temp_dir();
        let config = make_config(&dir);

        let page = dir.join("001-lab-one.html");
        std::fs::write(
            &page,
            r#"<html><body>
                <div class="section theme-white"><h1>Lab one</h1><a href="/docs">docs</a></div>
                <div class="section theme-white"><h1>Expert</h1><span class="label-purple-small">EXPERT</span></div>
            </body></html>"#,
        )
        .unwrap();

        let result = assemble(&config, &[page]).unwrap();
        assert_eq!(result.page_count, 1);
        assert_eq!(result.fragment_count, 1);
        assert_eq!(result.expert_skipped, 1);

        let document = std::fs::read_to_string(&config.output_path).unwrap();
        assert!(document.starts_with("<html><body>\n<div class=\"section theme-white\">"));
        assert!(document.contains("(001-lab-one)</h1>"));
        assert!(document.contains(r#"href="https://portswigger.net/docs""#));
        assert_eq!(document.matches(SEPARATOR).count(), 1);
        assert!(!document.contains("{{ content }}"));
        assert!(!dir.join(".PortSwiggerAllLabs.html.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn assemble_overwrites_previous_output() {
        let dir = temp_dir();
        let config = make_config(&dir);
        std::fs::write(&config.output_path, "stale").unwrap();

        let result = assemble(&config, &[]).unwrap();
        assert_eq!(result.fragment_count, 0);
        assert_eq!(
            std::fs::read_to_string(&config.output_path).unwrap(),
            "<html><body>\n\n</body></html>\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn fragments_follow_page_order() {
        let dir = temp_dir();
        let config = make_config(&dir);

        let second = dir.join("002-b.html");
        let first = dir.join("001-a.html");
        std::fs::write(&first, r#"<div class="section theme-white"><h1>A</h1></div>"#).unwrap();
        std::fs::write(&second, r#"<div class="section theme-white"><h1>B</h1></div>"#).unwrap();

        assemble(&config, &[second, first]).unwrap();
        let document = std::fs::read_to_string(&config.output_path).unwrap();
        let b = document.find("(002-b)").unwrap();
        let a = document.find("(001-a)").unwrap();
        assert!(b < a);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_template_is_fatal() {
        let dir = temp_dir();
        let mut config = make_config(&dir);
        config.template_path = dir.join("nope.html");

        let err = assemble(&config, &[]).unwrap_err();
        assert!(matches!(err, LabbookError::Io { .. }));
        assert!(!config.output_path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
