//! In-memory surface that serves captured HTML keyed by URL.
//!
//! Links are followed by `href`, so a chain of captured result pages with
//! `rel="next"` anchors paginates the same way the live site does. Nothing
//! sleeps: [`BrowsingSurface::pause`] returns immediately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use super::{BrowsingSurface, Locator, SurfaceLauncher};
use crate::error::SurfaceError;
use crate::parse_helpers::inner_text;

#[derive(Debug, Default, Clone)]
struct Script {
    routes: HashMap<String, String>,
    form_target: Option<String>,
}

#[derive(Debug)]
pub struct ReplaySurface {
    script: Arc<Script>,
    current: Option<(String, String)>,
    history: Vec<String>,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    closed: bool,
    closes: Arc<AtomicUsize>,
}

/// What a locator resolved to in the current document.
struct Hit {
    href: Option<String>,
}

impl Default for ReplaySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplaySurface {
    #[must_use]
    pub fn new() -> Self {
        Self::from_script(Arc::new(Script::default()), Arc::new(AtomicUsize::new(0)))
    }

    fn from_script(script: Arc<Script>, closes: Arc<AtomicUsize>) -> Self {
        Self {
            script,
            current: None,
            history: Vec::new(),
            clicks: Vec::new(),
            typed: Vec::new(),
            closed: false,
            closes,
        }
    }

    /// Serves `html` whenever `url` is loaded.
    #[must_use]
    pub fn route(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.script)
            .routes
            .insert(url.into(), html.into());
        self
    }

    /// Page loaded when the search form is submitted; without one, submitting times out.
    #[must_use]
    pub fn form_target(mut self, url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.script).form_target = Some(url.into());
        self
    }

    /// Every URL successfully loaded, in order.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    #[must_use]
    pub fn current_url(&self) -> Option<&str> {
        self.current.as_ref().map(|(url, _)| url.as_str())
    }

    #[must_use]
    pub fn clicks(&self) -> &[String] {
        &self.clicks
    }

    #[must_use]
    pub fn typed(&self) -> &[(String, String)] {
        &self.typed
    }

    /// Number of times this surface (or its launcher's siblings) was closed.
    #[must_use]
    pub fn teardown_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    fn ensure_open(&self) -> Result<(), SurfaceError> {
        if self.closed {
            Err(SurfaceError::Closed)
        } else {
            Ok(())
        }
    }

    fn document(&self) -> Result<&str, SurfaceError> {
        self.ensure_open()?;
        self.current
            .as_ref()
            .map(|(_, html)| html.as_str())
            .ok_or_else(|| SurfaceError::Evaluation("no document loaded".to_string()))
    }

    fn load(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.ensure_open()?;
        let html = self
            .script
            .routes
            .get(url)
            .cloned()
            .ok_or_else(|| SurfaceError::Navigation {
                url: url.to_string(),
                reason: "no captured page for this URL".to_string(),
            })?;
        self.history.push(url.to_string());
        self.current = Some((url.to_string(), html));
        Ok(())
    }

    fn resolve_href(&self, href: &str) -> Result<String, SurfaceError> {
        let base = self.current_url().unwrap_or_default();
        let joined = Url::parse(base)
            .and_then(|base| base.join(href))
            .map_err(|e| SurfaceError::Navigation {
                url: href.to_string(),
                reason: e.to_string(),
            })?;
        Ok(joined.into())
    }
}

fn locate(html: &str, target: &Locator) -> Result<Option<Hit>, SurfaceError> {
    let doc = Html::parse_document(html);
    let (selector_text, needles) = match target {
        Locator::Css(selector) => (selector.as_str(), None),
        Locator::Text { tag, needles } => (tag.as_str(), Some(needles)),
    };
    let selector = Selector::parse(selector_text)
        .map_err(|e| SurfaceError::Evaluation(format!("bad selector {selector_text}: {e}")))?;

    let hit = doc
        .select(&selector)
        .find(|el| needles.map_or(true, |n| Locator::text_matches(n, &inner_text(*el))))
        .map(|el| Hit {
            href: el.value().attr("href").map(str::to_string),
        });
    Ok(hit)
}

#[async_trait]
impl BrowsingSurface for ReplaySurface {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<(), SurfaceError> {
        self.load(url)
    }

    async fn content(&mut self) -> Result<String, SurfaceError> {
        self.document().map(str::to_string)
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, SurfaceError> {
        let html = self.document()?;
        Ok(locate(html, &Locator::css(selector))?.is_some())
    }

    async fn click(&mut self, target: &Locator) -> Result<bool, SurfaceError> {
        let found = locate(self.document()?, target)?.is_some();
        if found {
            self.clicks.push(target.to_string());
        }
        Ok(found)
    }

    async fn type_into(&mut self, target: &Locator, text: &str) -> Result<bool, SurfaceError> {
        let found = locate(self.document()?, target)?.is_some();
        if found {
            self.typed.push((target.to_string(), text.to_string()));
        }
        Ok(found)
    }

    async fn press_enter_and_wait(&mut self, timeout: Duration) -> Result<(), SurfaceError> {
        self.document()?;
        let Some(target) = self.script.form_target.clone() else {
            return Err(SurfaceError::Timeout {
                step: "form submission",
                secs: timeout.as_secs(),
            });
        };
        self.load(&target)
    }

    async fn click_and_wait(
        &mut self,
        target: &Locator,
        timeout: Duration,
    ) -> Result<bool, SurfaceError> {
        let Some(hit) = locate(self.document()?, target)? else {
            return Ok(false);
        };
        self.clicks.push(target.to_string());
        let Some(href) = hit.href else {
            return Err(SurfaceError::Timeout {
                step: "pagination",
                secs: timeout.as_secs(),
            });
        };
        let url = self.resolve_href(&href)?;
        self.load(&url)?;
        Ok(true)
    }

    async fn pause(&mut self, _duration: Duration) {}

    async fn close(&mut self) -> Result<(), SurfaceError> {
        if !self.closed {
            self.closed = true;
            self.current = None;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Hands out fresh [`ReplaySurface`]s over one shared set of captured pages.
#[derive(Debug, Clone)]
pub struct ReplayLauncher {
    script: Arc<Script>,
    launches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    fail_launch: bool,
}

impl ReplayLauncher {
    /// Every launched surface replays the routes configured on `surface`.
    #[must_use]
    pub fn new(surface: &ReplaySurface) -> Self {
        Self {
            script: Arc::clone(&surface.script),
            launches: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            fail_launch: false,
        }
    }

    /// A launcher whose every launch fails, as when no browser is installed.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::new(&ReplaySurface::new())
        }
    }

    #[must_use]
    pub fn launched(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn closed(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SurfaceLauncher for ReplayLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowsingSurface>, SurfaceError> {
        if self.fail_launch {
            return Err(SurfaceError::Launch("no browser available".to_string()));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ReplaySurface::from_script(
            Arc::clone(&self.script),
            Arc::clone(&self.closes),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn surface() -> ReplaySurface {
        ReplaySurface::new()
            .route(
                "https://site.test/a",
                r#"<html><body><h1>A</h1>
                   <button>Accetta tutti</button>
                   <a rel="next" href="/b">Avanti</a></body></html>"#,
            )
            .route(
                "https://site.test/b",
                r"<html><body><h1>B</h1><a class='next'>dead end</a></body></html>",
            )
    }

    #[tokio::test]
    async fn goto_unknown_url_is_a_navigation_error() {
        let mut s = surface();
        let err = s.goto("https://site.test/missing", TIMEOUT).await.unwrap_err();
        assert!(matches!(err, SurfaceError::Navigation { .. }), "got {err:?}");
        assert!(s.history().is_empty());
    }

    #[tokio::test]
    async fn text_locator_matches_rendered_text() {
        let mut s = surface();
        s.goto("https://site.test/a", TIMEOUT).await.unwrap();
        let hit = s
            .click(&Locator::Text {
                tag: "button".to_string(),
                needles: vec!["Accetta".to_string()],
            })
            .await
            .unwrap();
        assert!(hit);
        assert_eq!(s.clicks().len(), 1);
    }

    #[tokio::test]
    async fn click_and_wait_follows_relative_href() {
        let mut s = surface();
        s.goto("https://site.test/a", TIMEOUT).await.unwrap();
        let moved = s
            .click_and_wait(&Locator::css("a[rel=next]"), TIMEOUT)
            .await
            .unwrap();
        assert!(moved);
        assert_eq!(s.current_url(), Some("https://site.test/b"));
    }

    #[tokio::test]
    async fn click_and_wait_resolves_query_and_parent_hrefs() {
        let mut s = ReplaySurface::new()
            .route(
                "https://pg.test/ricerca/bar/milano",
                r#"<a rel="next" href="?page=2">2</a>"#,
            )
            .route(
                "https://pg.test/ricerca/bar/milano?page=2",
                r#"<a rel="next" href="../roma">roma</a>"#,
            )
            .route("https://pg.test/ricerca/roma", "<h1>Roma</h1>");
        s.goto("https://pg.test/ricerca/bar/milano", TIMEOUT)
            .await
            .unwrap();

        let next = Locator::css("a[rel=next]");
        assert!(s.click_and_wait(&next, TIMEOUT).await.unwrap());
        assert_eq!(
            s.current_url(),
            Some("https://pg.test/ricerca/bar/milano?page=2")
        );
        assert!(s.click_and_wait(&next, TIMEOUT).await.unwrap());
        assert_eq!(s.current_url(), Some("https://pg.test/ricerca/roma"));
    }

    #[tokio::test]
    async fn click_and_wait_without_href_times_out() {
        let mut s = surface();
        s.goto("https://site.test/b", TIMEOUT).await.unwrap();
        let err = s
            .click_and_wait(&Locator::css(".next"), TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, SurfaceError::Timeout { step: "pagination", .. }));
    }

    #[tokio::test]
    async fn close_is_idempotent_and_counted_once() {
        let mut s = surface();
        let count = s.teardown_count();
        s.close().await.unwrap();
        s.close().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(matches!(
            s.goto("https://site.test/a", TIMEOUT).await,
            Err(SurfaceError::Closed)
        ));
    }

    #[tokio::test]
    async fn launcher_tracks_launches_and_closes() {
        let launcher = ReplayLauncher::new(&surface());
        let mut first = launcher.launch().await.unwrap();
        first.goto("https://site.test/a", TIMEOUT).await.unwrap();
        first.close().await.unwrap();
        assert_eq!(launcher.launched(), 1);
        assert_eq!(launcher.closed(), 1);
    }
}
