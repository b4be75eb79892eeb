use crate::app_config::{AppConfig, BrowserSettings};
use crate::ConfigError;

/// Desktop Chrome UA presented by the per-request browser.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124 Safari/537.36";

const DEFAULT_PORT: &str = "10000";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match optional(var) {
            None => Ok(default),
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                invalid(var, format!("expected true/false, got \"{raw}\""))
            }),
        }
    };

    let port = or_default("PORT", DEFAULT_PORT);
    let bind_raw = or_default("PGSCOUT_BIND_ADDR", &format!("0.0.0.0:{port}"));
    let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| {
        invalid(
            if optional("PGSCOUT_BIND_ADDR").is_some() {
                "PGSCOUT_BIND_ADDR"
            } else {
                "PORT"
            },
            e.to_string(),
        )
    })?;

    let log_level = or_default("PGSCOUT_LOG_LEVEL", "info");
    let patterns_path = optional("PGSCOUT_PATTERNS_PATH").map(PathBuf::from);

    let executable_path = optional("PGSCOUT_CHROMIUM_PATH")
        .or_else(|| optional("CHROMIUM_PATH"))
        .map(PathBuf::from);

    let proxy_url = optional("PGSCOUT_PROXY_URL");
    if let Some(proxy) = &proxy_url {
        if !proxy.contains("://") {
            return Err(invalid(
                "PGSCOUT_PROXY_URL",
                "expected a scheme, e.g. http://host:port".to_string(),
            ));
        }
    }

    let navigation_timeout_secs = parse_u64("PGSCOUT_NAV_TIMEOUT_SECS", "60")?;
    let pagination_timeout_secs = parse_u64("PGSCOUT_PAGINATION_TIMEOUT_SECS", "30")?;
    if navigation_timeout_secs == 0 {
        return Err(invalid(
            "PGSCOUT_NAV_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    if pagination_timeout_secs == 0 {
        return Err(invalid(
            "PGSCOUT_PAGINATION_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let browser = BrowserSettings {
        headless: parse_bool("PGSCOUT_HEADLESS", true)?,
        light_mode: parse_bool("PGSCOUT_LIGHT_MODE", true)?,
        executable_path,
        proxy_url,
        user_agent: or_default("PGSCOUT_USER_AGENT", DEFAULT_USER_AGENT),
        navigation_timeout_secs,
        pagination_timeout_secs,
        ..BrowserSettings::default()
    };

    Ok(AppConfig {
        bind_addr,
        log_level,
        patterns_path,
        browser,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
