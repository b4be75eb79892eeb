pub mod consent;
pub mod error;
pub mod listings;
pub mod navigator;
pub mod normalize;
pub mod pagination;
pub(crate) mod parse_helpers;
pub mod patterns;
pub mod scout;
pub mod surface;
pub mod synonyms;

pub use consent::dismiss_consent_if_present;
pub use error::{ScraperError, SurfaceError};
pub use listings::parse_cards;
pub use navigator::{candidate_urls, Navigator};
pub use normalize::{dedup_labels, slugify};
pub use pagination::extract_listings;
pub use patterns::{load_patterns, CompiledPatterns, SitePatterns};
pub use scout::{Scout, Timing};
pub use surface::{BrowsingSurface, ChromiumLauncher, Locator, SurfaceLauncher};
#[cfg(any(test, feature = "replay"))]
pub use surface::{ReplayLauncher, ReplaySurface};
pub use synonyms::{extract_synonyms, SynonymStrategy};
