pub mod app_config;
pub mod config;
pub mod listings;
pub mod query;

pub use app_config::{AppConfig, BrowserSettings};
pub use config::{load_app_config, load_app_config_from_env};
pub use listings::{Listing, ListingRecord, NavigationOutcome};
pub use query::{Query, ScrapeOptions, DEFAULT_CITY, DEFAULT_REGION};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
