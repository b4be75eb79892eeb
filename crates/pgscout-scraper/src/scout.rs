//! The two operations the API exposes, composed from navigator, consent
//! handler and extractors over one browsing surface.

use std::sync::Arc;
use std::time::Duration;

use pgscout_core::{BrowserSettings, ListingRecord, Query, ScrapeOptions};

use crate::consent::CONSENT_DELAY;
use crate::error::ScraperError;
use crate::navigator::Navigator;
use crate::normalize::dedup_labels;
use crate::pagination::extract_listings;
use crate::patterns::CompiledPatterns;
use crate::surface::BrowsingSurface;
use crate::synonyms::extract_synonyms;

/// Bounds and settle pauses for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub navigation: Duration,
    pub pagination: Duration,
    pub consent_delay: Duration,
    /// Pause between reaching a results page and reading its synonyms.
    pub synonym_settle: Duration,
    /// Pause between reaching a term's results page and reading its cards.
    pub term_settle: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(60),
            pagination: Duration::from_secs(30),
            consent_delay: CONSENT_DELAY,
            synonym_settle: Duration::from_millis(700),
            term_settle: Duration::from_millis(600),
        }
    }
}

impl Timing {
    #[must_use]
    pub fn from_settings(settings: &BrowserSettings) -> Self {
        Self {
            navigation: Duration::from_secs(settings.navigation_timeout_secs),
            pagination: Duration::from_secs(settings.pagination_timeout_secs),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scout {
    patterns: Arc<CompiledPatterns>,
    timing: Timing,
}

impl Scout {
    #[must_use]
    pub fn new(patterns: Arc<CompiledPatterns>, timing: Timing) -> Self {
        Self { patterns, timing }
    }

    #[must_use]
    pub fn patterns(&self) -> &CompiledPatterns {
        &self.patterns
    }

    #[must_use]
    pub fn timing(&self) -> Timing {
        self.timing
    }

    fn navigator(&self) -> Navigator<'_> {
        Navigator::new(
            &self.patterns,
            self.timing.navigation,
            self.timing.consent_delay,
        )
    }

    /// Related-category labels for `query`, at most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::NavigationExhausted`] when no results page
    /// could be reached.
    pub async fn synonyms(
        &self,
        surface: &mut dyn BrowsingSurface,
        query: &Query,
        limit: usize,
    ) -> Result<Vec<String>, ScraperError> {
        let all = self.all_synonyms(surface, query).await?;
        Ok(dedup_labels(all, limit))
    }

    async fn all_synonyms(
        &self,
        surface: &mut dyn BrowsingSurface,
        query: &Query,
    ) -> Result<Vec<String>, ScraperError> {
        let outcome = self.navigator().resolve(surface, query).await;
        if !outcome.is_ok() {
            return Err(ScraperError::NavigationExhausted {
                query: query.category.clone(),
            });
        }

        surface.pause(self.timing.synonym_settle).await;
        let synonyms = match surface.content().await {
            Ok(html) => extract_synonyms(&html, &self.patterns),
            Err(e) => {
                tracing::warn!(category = %query.category, error = %e, "synonym snapshot failed");
                Vec::new()
            }
        };
        tracing::info!(
            category = %query.category,
            via = outcome.resolved_url().unwrap_or_default(),
            count = synonyms.len(),
            "synonyms extracted"
        );
        Ok(synonyms)
    }

    /// Search terms for a run: the category, then (optionally) up to
    /// `limit_syn` synonyms in page order.
    async fn expand_terms(
        &self,
        surface: &mut dyn BrowsingSurface,
        query: &Query,
        options: ScrapeOptions,
    ) -> Result<Vec<String>, ScraperError> {
        let mut terms = vec![query.category.clone()];
        if !options.use_synonyms {
            return Ok(terms);
        }

        let synonyms = self.all_synonyms(surface, query).await?;
        terms.extend(synonyms.into_iter().take(options.limit_syn));
        surface.pause(self.timing.term_settle).await;
        Ok(terms)
    }

    /// Company records for `query` and its expanded terms, capped at
    /// `options.limit_companies`.
    ///
    /// Terms whose results page cannot be reached contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::NavigationExhausted`] when synonym expansion
    /// is on and the bare category cannot be resolved.
    pub async fn scrape(
        &self,
        surface: &mut dyn BrowsingSurface,
        query: &Query,
        options: ScrapeOptions,
    ) -> Result<Vec<ListingRecord>, ScraperError> {
        let terms = self.expand_terms(surface, query, options).await?;
        tracing::debug!(category = %query.category, terms = ?terms, "terms expanded");

        let navigator = self.navigator();
        let mut records: Vec<ListingRecord> = Vec::new();

        for term in &terms {
            let remaining = options.limit_companies.saturating_sub(records.len());
            if remaining == 0 {
                break;
            }

            let term_query = query.with_category(format!("{term} {}", query.city));
            let outcome = navigator.resolve(surface, &term_query).await;
            if !outcome.is_ok() {
                tracing::warn!(term = %term, "no results page for term, skipping");
                continue;
            }

            surface.pause(self.timing.term_settle).await;
            let listings = extract_listings(
                surface,
                &self.patterns,
                remaining,
                options.max_pages,
                self.timing.pagination,
            )
            .await;
            tracing::info!(term = %term, count = listings.len(), "term scraped");
            records.extend(listings.into_iter().map(|listing| listing.tagged(term)));
        }

        records.truncate(options.limit_companies);
        Ok(records)
    }
}

#[cfg(test)]
#[path = "scout_test.rs"]
mod tests;
