//! Which lab sections are kept and which of their parts are cut out.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

/// Text that identifies the community solutions block.
pub const COMMUNITY_SOLUTIONS: &str = "Community solutions";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// A themed content section; one lab write-up per match.
pub(crate) static SECTION: LazyLock<Selector> =
    LazyLock::new(|| selector("div.section.theme-white"));

/// Purple difficulty label, carried only by expert labs.
static EXPERT_LABEL: LazyLock<Selector> = LazyLock::new(|| selector(".label-purple-small"));

/// Share widget, section footer and the page-loading overlay.
static STRIP_MARKERS: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    [
        selector(".share-right"),
        selector(".footer"),
        selector(".hidden.pageloadingmask"),
    ]
});

/// Collapsible solution block.
static SOLUTION: LazyLock<Selector> =
    LazyLock::new(|| selector(".component-solution.expandable-container"));

/// Whether the section is an expert lab and must be dropped whole.
pub fn is_expert(section: ElementRef<'_>) -> bool {
    section.select(&EXPERT_LABEL).next().is_some()
}

/// One cut applied to a kept section.
#[derive(Debug, Clone, Copy)]
pub enum Removal {
    /// First descendant matching the marker selector.
    Marker(&'static Selector),
    /// First solution block whose text mentions community solutions.
    CommunitySolution,
}

impl Removal {
    /// Descendant of `section` this cut removes, if any.
    pub fn target<'a>(&self, section: ElementRef<'a>) -> Option<ElementRef<'a>> {
        match self {
            Self::Marker(marker) => section.select(marker).next(),
            Self::CommunitySolution => section.select(&SOLUTION).find(|solution| {
                solution
                    .text()
                    .collect::<String>()
                    .contains(COMMUNITY_SOLUTIONS)
            }),
        }
    }
}

/// Cuts in the order they are applied; each sees the result of the previous one.
pub fn removals() -> impl Iterator<Item = Removal> {
    STRIP_MARKERS
        .iter()
        .map(Removal::Marker)
        .chain(std::iter::once(Removal::CommunitySolution))
}
