//! Business cards on one results page.

use pgscout_core::Listing;
use scraper::Html;

use crate::parse_helpers::element_text;
use crate::patterns::CompiledPatterns;

/// Extracts every card with a name from one page snapshot, in page order.
///
/// Phone and address fall back to empty strings; cards without a name are
/// dropped.
#[must_use]
pub fn parse_cards(html: &str, patterns: &CompiledPatterns) -> Vec<Listing> {
    let doc = Html::parse_document(html);

    doc.select(&patterns.cards)
        .filter_map(|card| {
            let name = card
                .select(&patterns.name)
                .next()
                .map(element_text)
                .unwrap_or_default();
            if name.is_empty() {
                return None;
            }

            let phone = card
                .select(&patterns.phone)
                .next()
                .and_then(|link| link.value().attr("href"))
                .map(|href| {
                    href.strip_prefix(patterns.phone_prefix.as_str())
                        .unwrap_or(href)
                        .trim()
                        .to_string()
                })
                .unwrap_or_default();

            let address = card
                .select(&patterns.address)
                .next()
                .map(element_text)
                .unwrap_or_default();

            Some(Listing {
                name,
                phone,
                address,
            })
        })
        .collect()
}
