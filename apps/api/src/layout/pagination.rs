//! Section paginator: decides which sections are visible on a given page.
//!
//! Pagination is recomputed from `(order, document, page_index)` on every call.
//! Policies hold configuration only, never per-call state.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::document::ResumeDocument;
use crate::layout::sections::SectionDescriptor;

/// Sections that `EssentialFirst` always places on page 0.
pub const ESSENTIAL_SECTION_IDS: [&str; 4] = ["summary", "experience", "education", "skills"];

pub const DEFAULT_SECTIONS_PER_PAGE: usize = 10;
pub const DEFAULT_FIRST_PAGE_CAPACITY: usize = 6;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// How much of a section a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionVisibility {
    pub visibility_percentage: f32,
    pub continues_from_previous: bool,
    pub continues_to_next: bool,
}

impl SectionVisibility {
    pub const WHOLE: SectionVisibility = SectionVisibility {
        visibility_percentage: 1.0,
        continues_from_previous: false,
        continues_to_next: false,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleSection {
    #[serde(flatten)]
    pub section: SectionDescriptor,
    #[serde(flatten)]
    pub visibility: SectionVisibility,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAssignment {
    pub page_index: usize,
    pub sections: Vec<VisibleSection>,
}

impl PageAssignment {
    fn whole(page_index: usize, sections: &[SectionDescriptor]) -> Self {
        Self {
            page_index,
            sections: sections
                .iter()
                .map(|s| VisibleSection {
                    section: s.clone(),
                    visibility: SectionVisibility::WHOLE,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Policy trait
// ────────────────────────────────────────────────────────────────────────────

/// Strategy for splitting a section order across pages.
pub trait PaginationPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sections visible on `page_index`. Out-of-range pages are empty, never an error.
    fn sections_for_page(
        &self,
        order: &[SectionDescriptor],
        document: &ResumeDocument,
        page_index: usize,
    ) -> PageAssignment;

    /// Number of non-empty pages. Always at least 1.
    fn page_count(&self, order: &[SectionDescriptor], document: &ResumeDocument) -> usize {
        let mut pages = 1;
        while !self.sections_for_page(order, document, pages).is_empty() {
            pages += 1;
        }
        pages
    }
}

/// Everything on page 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePage;

impl PaginationPolicy for SinglePage {
    fn name(&self) -> &'static str {
        "single"
    }

    fn sections_for_page(
        &self,
        order: &[SectionDescriptor],
        _document: &ResumeDocument,
        page_index: usize,
    ) -> PageAssignment {
        match page_index {
            0 => PageAssignment::whole(0, order),
            _ => PageAssignment::whole(page_index, &[]),
        }
    }

    fn page_count(&self, _order: &[SectionDescriptor], _document: &ResumeDocument) -> usize {
        1
    }
}

/// Consecutive chunks of at most `per_page` sections.
#[derive(Debug, Clone, Copy)]
pub struct FixedChunk {
    pub per_page: usize,
}

impl Default for FixedChunk {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_SECTIONS_PER_PAGE,
        }
    }
}

impl PaginationPolicy for FixedChunk {
    fn name(&self) -> &'static str {
        "chunked"
    }

    fn sections_for_page(
        &self,
        order: &[SectionDescriptor],
        _document: &ResumeDocument,
        page_index: usize,
    ) -> PageAssignment {
        let chunk = order
            .chunks(self.per_page.max(1))
            .nth(page_index)
            .unwrap_or(&[]);
        PageAssignment::whole(page_index, chunk)
    }
}

/// Essential sections first on page 0, backfilled in order up to
/// `first_page_capacity`; the rest in chunks of `per_page`.
#[derive(Debug, Clone, Copy)]
pub struct EssentialFirst {
    pub first_page_capacity: usize,
    pub per_page: usize,
}

impl Default for EssentialFirst {
    fn default() -> Self {
        Self {
            first_page_capacity: DEFAULT_FIRST_PAGE_CAPACITY,
            per_page: DEFAULT_FIRST_PAGE_CAPACITY,
        }
    }
}

impl EssentialFirst {
    /// Splits the order into page 0 and the remainder.
    fn split(&self, order: &[SectionDescriptor]) -> (Vec<SectionDescriptor>, Vec<SectionDescriptor>) {
        let (mut first, others): (Vec<_>, Vec<_>) = order
            .iter()
            .cloned()
            .partition(|s| ESSENTIAL_SECTION_IDS.contains(&s.id.as_str()));

        let room = self.first_page_capacity.saturating_sub(first.len());
        let mut others = others.into_iter();
        first.extend(others.by_ref().take(room));
        (first, others.collect())
    }
}

impl PaginationPolicy for EssentialFirst {
    fn name(&self) -> &'static str {
        "essential"
    }

    fn sections_for_page(
        &self,
        order: &[SectionDescriptor],
        _document: &ResumeDocument,
        page_index: usize,
    ) -> PageAssignment {
        let (first, rest) = self.split(order);
        if page_index == 0 {
            return PageAssignment::whole(0, &first);
        }
        let chunk = rest
            .chunks(self.per_page.max(1))
            .nth(page_index - 1)
            .unwrap_or(&[]);
        PageAssignment::whole(page_index, chunk)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Selection
// ────────────────────────────────────────────────────────────────────────────

/// Configured pagination mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaginationMode {
    #[default]
    Single,
    Chunked,
    Essential,
}

impl FromStr for PaginationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "chunked" => Ok(Self::Chunked),
            "essential" => Ok(Self::Essential),
            other => Err(format!(
                "unknown pagination policy '{other}' (expected single, chunked or essential)"
            )),
        }
    }
}

impl PaginationMode {
    /// Builds the policy. `per_page` overrides the page size of the chunked and
    /// essential policies; under `essential` it also caps page 0.
    pub fn build(self, per_page: Option<usize>) -> Arc<dyn PaginationPolicy> {
        match self {
            Self::Single => Arc::new(SinglePage),
            Self::Chunked => Arc::new(FixedChunk {
                per_page: per_page.unwrap_or(DEFAULT_SECTIONS_PER_PAGE),
            }),
            Self::Essential => Arc::new(per_page.map_or_else(EssentialFirst::default, |n| EssentialFirst {
                first_page_capacity: n,
                per_page: n,
            })),
        }
    }
}
