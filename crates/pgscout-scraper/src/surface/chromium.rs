//! Headless Chromium surface driven over CDP via `chromiumoxide`.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use pgscout_core::BrowserSettings;
use tokio::task::JoinHandle;

use super::{BrowsingSurface, Locator, SurfaceLauncher};
use crate::error::SurfaceError;

/// Upper bound on the post-load idle probe.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves once `document.readyState` is complete and no new resource
/// entries have appeared for `idleMs`, or when the time budget runs out.
const NETWORK_IDLE_JS: &str = r"(async (timeoutMs) => {
    const idleMs = 500;
    const interval = 100;
    const start = Date.now();
    let last = performance.getEntriesByType('resource').length;
    let stable = 0;
    while (Date.now() - start < timeoutMs) {
        await new Promise(r => setTimeout(r, interval));
        const cur = performance.getEntriesByType('resource').length;
        if (document.readyState === 'complete' && cur === last) {
            stable += interval;
            if (stable >= idleMs) return true;
        } else {
            stable = 0;
        }
        last = cur;
    }
    return false;
})";

/// Launch arguments for the given settings.
#[must_use]
pub fn launch_args(settings: &BrowserSettings) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-setuid-sandbox".to_string(),
        format!("--user-agent={}", settings.user_agent),
    ];
    if let Some(proxy) = &settings.proxy_url {
        args.push(format!("--proxy-server={proxy}"));
    }
    if settings.light_mode {
        args.extend(
            ["--disable-dev-shm-usage", "--no-zygote", "--single-process"]
                .into_iter()
                .map(String::from),
        );
    }
    args
}

/// Launches one Chromium process per [`SurfaceLauncher::launch`] call.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self) -> Result<BrowserConfig, SurfaceError> {
        let (width, height) = self.settings.viewport;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .viewport(None)
            .request_timeout(Duration::from_secs(self.settings.navigation_timeout_secs))
            .args(launch_args(&self.settings));
        if !self.settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.settings.executable_path {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(SurfaceError::Launch)
    }
}

#[async_trait]
impl SurfaceLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowsingSurface>, SurfaceError> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SurfaceError::Launch(e.to_string()))?;

        // The handler drives the CDP connection and must be polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let mut surface = ChromiumSurface {
            browser: Some(browser),
            page: None,
            handler_task,
            blocker_task: None,
        };

        if let Err(e) = surface.open_page(self.settings.light_mode).await {
            let _ = surface.close().await;
            return Err(e);
        }

        tracing::debug!(
            headless = self.settings.headless,
            light_mode = self.settings.light_mode,
            "browser launched"
        );
        Ok(Box::new(surface))
    }
}

/// One browser process with a single working tab.
pub struct ChromiumSurface {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    blocker_task: Option<JoinHandle<()>>,
}

impl ChromiumSurface {
    async fn open_page(&mut self, block_heavy_assets: bool) -> Result<(), SurfaceError> {
        let browser = self.browser.as_ref().ok_or(SurfaceError::Closed)?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SurfaceError::Launch(e.to_string()))?;

        if block_heavy_assets {
            self.blocker_task = Some(block_resources(&page).await?);
        }

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page, SurfaceError> {
        self.page.as_ref().ok_or(SurfaceError::Closed)
    }

    async fn find(&self, target: &Locator) -> Result<Option<Element>, SurfaceError> {
        let page = self.page()?;
        match target {
            Locator::Css(selector) => match page.find_elements(selector.as_str()).await {
                Ok(mut found) => Ok(if found.is_empty() {
                    None
                } else {
                    Some(found.swap_remove(0))
                }),
                Err(CdpError::NotFound) => Ok(None),
                Err(e) => Err(evaluation(e)),
            },
            Locator::Text { tag, needles } => {
                let candidates = match page.find_elements(tag.as_str()).await {
                    Ok(found) => found,
                    Err(CdpError::NotFound) => return Ok(None),
                    Err(e) => return Err(evaluation(e)),
                };
                for element in candidates {
                    let text = element.inner_text().await.map_err(evaluation)?;
                    if text.is_some_and(|t| Locator::text_matches(needles, &t)) {
                        return Ok(Some(element));
                    }
                }
                Ok(None)
            }
        }
    }

    async fn wait_for_navigation(
        &self,
        step: &'static str,
        timeout: Duration,
    ) -> Result<(), SurfaceError> {
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(SurfaceError::Navigation {
                    url: page.url().await.ok().flatten().unwrap_or_default(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(SurfaceError::Timeout {
                    step,
                    secs: timeout.as_secs(),
                })
            }
        }
        self.settle().await;
        Ok(())
    }

    /// Best-effort network-idle wait after a load.
    async fn settle(&self) {
        let Ok(page) = self.page() else {
            return;
        };
        let script = format!("{NETWORK_IDLE_JS}({})", SETTLE_TIMEOUT.as_millis());
        match page.evaluate(script).await {
            Ok(result) => {
                if !result.into_value::<bool>().unwrap_or(false) {
                    tracing::debug!("network-idle probe timed out");
                }
            }
            Err(e) => tracing::debug!(error = %e, "network-idle probe failed"),
        }
    }
}

/// Fails image, media and font requests before they leave the browser.
async fn block_resources(page: &Page) -> Result<JoinHandle<()>, SurfaceError> {
    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| SurfaceError::Launch(e.to_string()))?;

    let blocker = page.clone();
    let task = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let fail = FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
            if let Err(e) = blocker.execute(fail).await {
                tracing::debug!(error = %e, "failed to block subresource");
            }
        }
    });

    let patterns: Vec<RequestPattern> = [ResourceType::Image, ResourceType::Media, ResourceType::Font]
        .into_iter()
        .map(|kind| RequestPattern::builder().resource_type(kind).build())
        .collect();
    page.execute(EnableParams::builder().patterns(patterns).build())
        .await
        .map_err(|e| SurfaceError::Launch(e.to_string()))?;

    Ok(task)
}

fn evaluation(e: CdpError) -> SurfaceError {
    SurfaceError::Evaluation(e.to_string())
}

#[async_trait]
impl BrowsingSurface for ChromiumSurface {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), SurfaceError> {
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(SurfaceError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(SurfaceError::Timeout {
                    step: "navigation",
                    secs: timeout.as_secs(),
                })
            }
        }
        self.settle().await;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, SurfaceError> {
        self.page()?.content().await.map_err(evaluation)
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, SurfaceError> {
        Ok(self.find(&Locator::css(selector)).await?.is_some())
    }

    async fn click(&mut self, target: &Locator) -> Result<bool, SurfaceError> {
        let Some(element) = self.find(target).await? else {
            return Ok(false);
        };
        element.click().await.map_err(evaluation)?;
        Ok(true)
    }

    async fn type_into(&mut self, target: &Locator, text: &str) -> Result<bool, SurfaceError> {
        let Some(element) = self.find(target).await? else {
            return Ok(false);
        };
        element.click().await.map_err(evaluation)?;
        element.type_str(text).await.map_err(evaluation)?;
        Ok(true)
    }

    async fn press_enter_and_wait(&mut self, timeout: Duration) -> Result<(), SurfaceError> {
        let focused = match self.find(&Locator::css(":focus")).await? {
            Some(element) => element,
            None => self
                .find(&Locator::css("body"))
                .await?
                .ok_or_else(|| SurfaceError::SelectorNotFound("body".to_string()))?,
        };
        focused.press_key("Enter").await.map_err(evaluation)?;
        self.wait_for_navigation("form submission", timeout).await
    }

    async fn click_and_wait(
        &mut self,
        target: &Locator,
        timeout: Duration,
    ) -> Result<bool, SurfaceError> {
        let Some(element) = self.find(target).await? else {
            return Ok(false);
        };
        element.click().await.map_err(evaluation)?;
        self.wait_for_navigation("pagination", timeout).await?;
        Ok(true)
    }

    async fn pause(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn close(&mut self) -> Result<(), SurfaceError> {
        if let Some(task) = self.blocker_task.take() {
            task.abort();
        }
        self.page = None;
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let result = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| SurfaceError::Evaluation(e.to_string()));
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "browser process wait failed");
        }
        self.handler_task.abort();
        result
    }
}

impl Drop for ChromiumSurface {
    fn drop(&mut self) {
        if let Some(task) = self.blocker_task.take() {
            task.abort();
        }
        self.handler_task.abort();
    }
}
