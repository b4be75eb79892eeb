//! Related-category labels scraped from a results page.
//!
//! The site exposes no stable markup for "related categories", so extraction
//! is a cascade of strategies over one DOM snapshot. The structural layers
//! always run; the plain-text fallback only runs when they found nothing.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::normalize::{collapse_whitespace, dedup_labels};
use crate::parse_helpers::{element_text, enclosing_container, inner_text};
use crate::patterns::CompiledPatterns;

/// Separator between labels in the rendered-text fallback.
static TEXT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}|\n").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynonymStrategy {
    /// Label elements inside filter/facet blocks.
    FilterBlocks,
    /// Label elements in the section around a "Tipi di…"-style heading.
    LabelledSections,
    /// Lines following the "Tipi di" marker in the rendered page text.
    TextFallback,
}

impl SynonymStrategy {
    pub const CASCADE: [Self; 3] = [
        Self::FilterBlocks,
        Self::LabelledSections,
        Self::TextFallback,
    ];

    /// Whether this strategy only runs when earlier ones produced nothing.
    #[must_use]
    pub fn is_fallback(self) -> bool {
        matches!(self, Self::TextFallback)
    }

    /// Raw candidate labels, before filtering.
    fn candidates(self, doc: &Html, patterns: &CompiledPatterns) -> Vec<String> {
        match self {
            Self::FilterBlocks => doc
                .select(&patterns.filter_blocks)
                .flat_map(|block| block.select(&patterns.label_elements))
                .map(element_text)
                .collect(),
            Self::LabelledSections => doc
                .select(&patterns.headings)
                .filter(|heading| patterns.heading_pattern.is_match(&element_text(*heading)))
                .filter_map(|heading| enclosing_container(heading, &patterns.section_ancestors))
                .flat_map(|section| section.select(&patterns.label_elements))
                .map(element_text)
                .collect(),
            Self::TextFallback => {
                let text = inner_text(doc.root_element());
                let Some(marker) = patterns.text_marker.find(&text) else {
                    return Vec::new();
                };
                let window: String = text[marker.end()..]
                    .chars()
                    .take(patterns.text_window)
                    .collect();
                TEXT_SPLIT
                    .split(&window)
                    .map(collapse_whitespace)
                    .collect()
            }
        }
    }
}

/// Runs the strategy cascade over `html` and returns accepted labels in
/// first-seen order without duplicates. Callers apply their own limit.
#[must_use]
pub fn extract_synonyms(html: &str, patterns: &CompiledPatterns) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut bag: Vec<String> = Vec::new();

    for strategy in SynonymStrategy::CASCADE {
        if strategy.is_fallback() && !bag.is_empty() {
            break;
        }
        let before = bag.len();
        bag.extend(
            strategy
                .candidates(&doc, patterns)
                .into_iter()
                .filter(|label| patterns.accepts_label(label)),
        );
        tracing::trace!(?strategy, accepted = bag.len() - before, "synonym strategy ran");
    }

    dedup_labels(bag, usize::MAX)
}

#[cfg(test)]
#[path = "synonyms_test.rs"]
mod tests;
