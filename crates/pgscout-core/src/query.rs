use serde::{Deserialize, Serialize};

pub const DEFAULT_CITY: &str = "milano";
pub const DEFAULT_REGION: &str = "lombardia";

/// One category lookup scoped to a locale. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub category: String,
    pub city: String,
    pub region: String,
}

impl Query {
    /// Builds a query, falling back to the default locale for blank parts.
    ///
    /// Returns `None` when `category` is blank.
    #[must_use]
    pub fn new(category: &str, city: Option<&str>, region: Option<&str>) -> Option<Self> {
        let category = category.trim();
        if category.is_empty() {
            return None;
        }
        let or_default = |value: Option<&str>, default: &str| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        Some(Self {
            category: category.to_string(),
            city: or_default(city, DEFAULT_CITY),
            region: or_default(region, DEFAULT_REGION),
        })
    }

    /// Same locale, different search text.
    #[must_use]
    pub fn with_category(&self, category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            city: self.city.clone(),
            region: self.region.clone(),
        }
    }
}

/// Knobs for a `scrape` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub limit_companies: usize,
    pub max_pages: usize,
    pub use_synonyms: bool,
    pub limit_syn: usize,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            limit_companies: 60,
            max_pages: 3,
            use_synonyms: true,
            limit_syn: 6,
        }
    }
}
