use std::net::SocketAddr;
use std::path::PathBuf;

/// Launch and timing settings for the per-request browser.
#[derive(Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Adds low-memory launch flags and blocks image/media/font requests.
    pub light_mode: bool,
    pub executable_path: Option<PathBuf>,
    pub proxy_url: Option<String>,
    pub user_agent: String,
    pub navigation_timeout_secs: u64,
    pub pagination_timeout_secs: u64,
    pub viewport: (u32, u32),
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            light_mode: true,
            executable_path: None,
            proxy_url: None,
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
            navigation_timeout_secs: 60,
            pagination_timeout_secs: 30,
            viewport: (1366, 900),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub patterns_path: Option<PathBuf>,
    pub browser: BrowserSettings,
}

impl std::fmt::Debug for BrowserSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSettings")
            .field("headless", &self.headless)
            .field("light_mode", &self.light_mode)
            .field("executable_path", &self.executable_path)
            .field(
                "proxy_url",
                &self.proxy_url.as_ref().map(|_| "[redacted]"),
            )
            .field("user_agent", &self.user_agent)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("pagination_timeout_secs", &self.pagination_timeout_secs)
            .field("viewport", &self.viewport)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("patterns_path", &self.patterns_path)
            .field("browser", &self.browser)
            .finish()
    }
}
