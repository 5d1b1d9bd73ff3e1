//! Lab section extraction.
//!
//! Parses an archived lab page, keeps every themed content section that is
//! not an expert lab, cuts the share widget, footer, loading overlay and
//! community solutions out of it, serializes it as indented HTML and applies
//! the textual rewrites (expanded `<details>`, absolute links, labelled
//! heading).

pub mod filter;
pub mod format;
pub mod rewrite;

use std::path::Path;

use scraper::{ElementRef, Html};
use tracing::{debug, instrument};

use labbook_shared::{ContentFragment, LabbookError, Result, label_for};

/// Sections pulled out of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSections {
    /// Formatted sections, in document order.
    pub sections: Vec<String>,
    /// Sections dropped because they carry the expert label.
    pub expert_skipped: usize,
}

/// Fragments produced from one archived page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtract {
    /// Rewritten fragments, in document order.
    pub fragments: Vec<ContentFragment>,
    /// Sections dropped because they carry the expert label.
    pub expert_skipped: usize,
}

/// Read an archived page and extract its fragments, labelled by file stem.
pub fn extract_file(path: &Path, site_origin: &str) -> Result<PageExtract> {
    let html = std::fs::read_to_string(path).map_err(|e| LabbookError::io(path, e))?;
    Ok(extract_fragments(&html, &label_for(path), site_origin))
}

/// Extract the fragments of one page.
#[instrument(skip(html, site_origin))]
pub fn extract_fragments(html: &str, label: &str, site_origin: &str) -> PageExtract {
    let PageSections {
        sections,
        expert_skipped,
    } = clean_sections(html);

    let fragments = sections
        .iter()
        .map(|section| ContentFragment {
            label: label.to_string(),
            html: rewrite::run_pipeline(section, site_origin, label),
        })
        .collect::<Vec<_>>();

    debug!(
        fragments = fragments.len(),
        expert_skipped, "page extracted"
    );

    PageExtract {
        fragments,
        expert_skipped,
    }
}

/// Select, filter and format the content sections of a page, without rewrites.
pub fn clean_sections(html: &str) -> PageSections {
    let mut doc = Html::parse_document(html);
    let section_ids: Vec<_> = doc.select(&filter::SECTION).map(|s| s.id()).collect();

    let mut out = PageSections::default();
    for section_id in section_ids {
        let Some(section) = doc.tree.get(section_id).and_then(ElementRef::wrap) else {
            continue;
        };
        if filter::is_expert(section) {
            out.expert_skipped += 1;
            continue;
        }

        for removal in filter::removals() {
            let target = doc
                .tree
                .get(section_id)
                .and_then(ElementRef::wrap)
                .and_then(|section| removal.target(section))
                .map(|el| el.id());

            if let Some(mut node) = target.and_then(|id| doc.tree.get_mut(id)) {
                node.detach();
            }
        }

        if let Some(section) = doc.tree.get(section_id).and_then(ElementRef::wrap) {
            out.sections.push(format::prettify(section));
        }
    }

    out
}
