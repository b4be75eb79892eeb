//! The browsing capability the pipeline drives.
//!
//! Every component receives the surface as `&mut dyn BrowsingSurface`; there
//! is no ambient page handle. [`chromium`] drives a real headless browser,
//! `replay` (behind the `replay` feature) serves captured HTML from memory.

pub mod chromium;
#[cfg(any(test, feature = "replay"))]
pub mod replay;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SurfaceError;

pub use chromium::{ChromiumLauncher, ChromiumSurface};
#[cfg(any(test, feature = "replay"))]
pub use replay::{ReplayLauncher, ReplaySurface};

/// How to find the element an interaction targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A CSS selector list; the first match in document order wins.
    Css(String),
    /// The first `tag` element whose rendered text contains any needle
    /// (case-sensitive, like an XPath `contains(., …)`).
    Text { tag: String, needles: Vec<String> },
}

impl Locator {
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Whether `text` satisfies a [`Locator::Text`] predicate.
    pub(crate) fn text_matches(needles: &[String], text: &str) -> bool {
        needles.iter().any(|needle| text.contains(needle.as_str()))
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "{selector}"),
            Locator::Text { tag, needles } => write!(f, "{tag}[text~{}]", needles.join("|")),
        }
    }
}

/// A single loaded document in a controllable browser.
///
/// Interactions that may find nothing return `Ok(false)` rather than an
/// error; errors are reserved for the browser failing to do what was asked.
#[async_trait]
pub trait BrowsingSurface: Send {
    /// Loads `url` and waits for network activity to settle.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), SurfaceError>;

    /// Serialized HTML of the current document.
    async fn content(&mut self) -> Result<String, SurfaceError>;

    async fn exists(&mut self, selector: &str) -> Result<bool, SurfaceError>;

    async fn click(&mut self, target: &Locator) -> Result<bool, SurfaceError>;

    /// Clicks `target` and types `text` into it.
    async fn type_into(&mut self, target: &Locator, text: &str) -> Result<bool, SurfaceError>;

    /// Presses Enter on the focused element and waits for the navigation it triggers.
    async fn press_enter_and_wait(&mut self, timeout: Duration) -> Result<(), SurfaceError>;

    /// Clicks `target` and waits for the navigation it triggers. `Ok(false)`
    /// when nothing matches.
    async fn click_and_wait(
        &mut self,
        target: &Locator,
        timeout: Duration,
    ) -> Result<bool, SurfaceError>;

    async fn pause(&mut self, duration: Duration);

    /// Releases the browser. Safe to call more than once.
    async fn close(&mut self) -> Result<(), SurfaceError>;
}

/// Creates one isolated surface per request.
#[async_trait]
pub trait SurfaceLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowsingSurface>, SurfaceError>;
}
