//! Walking result pages through the "next" control.
//!
//! The walk is strictly sequential on one page handle: snapshot, parse,
//! click next, wait for the navigation, repeat. It ends at the first of:
//! enough listings, the page budget spent, no next control, or a failed
//! click/wait. Whatever was gathered up to that point is kept.

use std::time::Duration;

use pgscout_core::Listing;

use crate::listings::parse_cards;
use crate::patterns::CompiledPatterns;
use crate::surface::BrowsingSurface;

/// Extracts up to `limit` listings from the current page and at most
/// `max_pages - 1` following pages. A zero budget reads nothing.
///
/// A page whose snapshot fails counts as an empty page; pagination still
/// moves on from it.
pub async fn extract_listings(
    surface: &mut dyn BrowsingSurface,
    patterns: &CompiledPatterns,
    limit: usize,
    max_pages: usize,
    wait: Duration,
) -> Vec<Listing> {
    let mut listings = Vec::new();
    if limit == 0 || max_pages == 0 {
        return listings;
    }

    let mut page = 1usize;
    loop {
        let found = match surface.content().await {
            Ok(html) => parse_cards(&html, patterns),
            Err(e) => {
                tracing::warn!(page, error = %e, "page snapshot failed, treating as empty");
                Vec::new()
            }
        };
        tracing::debug!(page, count = found.len(), "listings parsed");
        listings.extend(found);

        if listings.len() >= limit || page >= max_pages {
            break;
        }

        match surface.click_and_wait(&patterns.next_page, wait).await {
            Ok(true) => page += 1,
            Ok(false) => {
                tracing::debug!(page, "no next-page control");
                break;
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "pagination stopped");
                break;
            }
        }
    }

    listings.truncate(limit);
    listings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ReplaySurface;

    const WAIT: Duration = Duration::from_secs(1);

    fn card(name: &str) -> String {
        format!(r#"<article><h2>{name}</h2><a href="tel:02{}">t</a></article>"#, name.len())
    }

    fn results_page(names: &[&str], next: Option<&str>) -> String {
        let cards: String = names.iter().map(|n| card(n)).collect();
        let next = next
            .map(|href| format!(r#"<a rel="next" href="{href}">Avanti</a>"#))
            .unwrap_or_default();
        format!("<html><body><h1>Risultati</h1>{cards}<nav>{next}</nav></body></html>")
    }

    fn three_pages() -> ReplaySurface {
        ReplaySurface::new()
            .route(
                "https://pg.test/p1",
                results_page(&["A1", "A2"], Some("/p2")),
            )
            .route(
                "https://pg.test/p2",
                results_page(&["B1", "B2"], Some("/p3")),
            )
            .route("https://pg.test/p3", results_page(&["C1"], None))
    }

    fn names(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.name.as_str()).collect()
    }

    #[tokio::test]
    async fn follows_next_until_last_page() {
        let patterns = CompiledPatterns::builtin().unwrap();
        let mut surface = three_pages();
        surface.goto("https://pg.test/p1", WAIT).await.unwrap();

        let out = extract_listings(&mut surface, &patterns, 60, 10, WAIT).await;
        assert_eq!(names(&out), vec!["A1", "A2", "B1", "B2", "C1"]);
    }

    #[tokio::test]
    async fn stops_at_limit_without_clicking_further() {
        let patterns = CompiledPatterns::builtin().unwrap();
        let mut surface = three_pages();
        surface.goto("https://pg.test/p1", WAIT).await.unwrap();

        let out = extract_listings(&mut surface, &patterns, 3, 10, WAIT).await;
        assert_eq!(names(&out), vec!["A1", "A2", "B1"]);
        assert_eq!(surface.history().len(), 2);
    }

    #[tokio::test]
    async fn page_budget_is_respected() {
        let patterns = CompiledPatterns::builtin().unwrap();
        let mut surface = three_pages();
        surface.goto("https://pg.test/p1", WAIT).await.unwrap();

        let out = extract_listings(&mut surface, &patterns, 60, 2, WAIT).await;
        assert_eq!(names(&out), vec!["A1", "A2", "B1", "B2"]);
        assert_eq!(surface.clicks().len(), 1, "never clicks past the last allowed page");
    }

    #[tokio::test]
    async fn failed_navigation_keeps_accumulated_listings() {
        let patterns = CompiledPatterns::builtin().unwrap();
        let mut surface =
            ReplaySurface::new().route("https://pg.test/p1", results_page(&["A1"], Some("/gone")));
        surface.goto("https://pg.test/p1", WAIT).await.unwrap();

        let out = extract_listings(&mut surface, &patterns, 60, 3, WAIT).await;
        assert_eq!(names(&out), vec!["A1"]);
    }

    #[tokio::test]
    async fn snapshot_failure_counts_as_empty_page() {
        let patterns = CompiledPatterns::builtin().unwrap();
        let mut surface = ReplaySurface::new();

        let out = extract_listings(&mut surface, &patterns, 60, 3, WAIT).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn zero_limit_reads_nothing() {
        let patterns = CompiledPatterns::builtin().unwrap();
        let mut surface = three_pages();
        surface.goto("https://pg.test/p1", WAIT).await.unwrap();

        assert!(extract_listings(&mut surface, &patterns, 0, 3, WAIT).await.is_empty());
        assert_eq!(surface.history().len(), 1);
    }

    #[tokio::test]
    async fn zero_page_budget_reads_nothing() {
        let patterns = CompiledPatterns::builtin().unwrap();
        let mut surface = three_pages();
        surface.goto("https://pg.test/p1", WAIT).await.unwrap();

        assert!(extract_listings(&mut surface, &patterns, 60, 0, WAIT).await.is_empty());
        assert!(surface.clicks().is_empty());
    }
}
