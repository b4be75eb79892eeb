//! Reaching a results page for a query.
//!
//! Candidate URLs are tried in a fixed order, each followed by a consent
//! sweep and a results-heading probe. When none shows a heading, the home
//! page search form is filled and submitted instead.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use pgscout_core::{NavigationOutcome, Query};

use crate::consent::dismiss_consent_if_present;
use crate::error::SurfaceError;
use crate::normalize::slugify;
use crate::patterns::CompiledPatterns;
use crate::surface::BrowsingSurface;

/// Characters `encodeURIComponent` leaves alone besides ASCII alphanumerics.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

/// Direct result-page URLs for `query`, most specific first.
#[must_use]
pub fn candidate_urls(base_url: &str, query: &Query) -> [String; 3] {
    let base = base_url.trim_end_matches('/');
    let term = encode_component(&query.category);
    [
        format!("{base}/ricerca/{term}/{}", encode_component(&query.city)),
        format!(
            "{base}/{}/{}/{}.html",
            query.region,
            query.city,
            slugify(&query.category)
        ),
        format!("{base}/ricerca/{term}"),
    ]
}

#[derive(Debug, Clone, Copy)]
pub struct Navigator<'a> {
    patterns: &'a CompiledPatterns,
    timeout: Duration,
    consent_delay: Duration,
}

impl<'a> Navigator<'a> {
    #[must_use]
    pub fn new(patterns: &'a CompiledPatterns, timeout: Duration, consent_delay: Duration) -> Self {
        Self {
            patterns,
            timeout,
            consent_delay,
        }
    }

    /// Tries every direct candidate, then the search form.
    ///
    /// Never errors: each failed step is logged and the next one tried.
    /// [`NavigationOutcome::Exhausted`] means nothing worked.
    pub async fn resolve(
        &self,
        surface: &mut dyn BrowsingSurface,
        query: &Query,
    ) -> NavigationOutcome {
        for url in candidate_urls(&self.patterns.base_url, query) {
            match self.try_candidate(surface, &url).await {
                Ok(true) => {
                    tracing::debug!(url = %url, "results page reached");
                    return NavigationOutcome::Direct(url);
                }
                Ok(false) => tracing::debug!(url = %url, "candidate has no results heading"),
                Err(e) => tracing::debug!(url = %url, error = %e, "candidate failed"),
            }
        }

        match self.submit_search_form(surface, query).await {
            Ok(()) => {
                tracing::debug!(category = %query.category, "search form submitted");
                NavigationOutcome::Form
            }
            Err(e) => {
                tracing::debug!(category = %query.category, error = %e, "search form failed");
                NavigationOutcome::Exhausted
            }
        }
    }

    async fn try_candidate(
        &self,
        surface: &mut dyn BrowsingSurface,
        url: &str,
    ) -> Result<bool, SurfaceError> {
        surface.goto(url, self.timeout).await?;
        dismiss_consent_if_present(surface, self.patterns, self.consent_delay).await;
        surface.exists(&self.patterns.results_heading).await
    }

    async fn submit_search_form(
        &self,
        surface: &mut dyn BrowsingSurface,
        query: &Query,
    ) -> Result<(), SurfaceError> {
        let home = format!("{}/", self.patterns.base_url);
        surface.goto(&home, self.timeout).await?;
        dismiss_consent_if_present(surface, self.patterns, self.consent_delay).await;

        let typed_what = surface
            .type_into(&self.patterns.what_input, &query.category)
            .await?;
        let typed_where = surface
            .type_into(&self.patterns.where_input, &query.city)
            .await?;
        if !typed_what && !typed_where {
            return Err(SurfaceError::SelectorNotFound(
                self.patterns.what_input.to_string(),
            ));
        }

        surface.press_enter_and_wait(self.timeout).await
    }
}

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;
