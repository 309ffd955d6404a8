use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Default Apify REST API root.
pub const DEFAULT_APIFY_BASE_URL: &str = "https://api.apify.com/v2";

/// Apify actor used for both profile (`details`) and post (`posts`) scrapes.
pub const DEFAULT_INSTAGRAM_ACTOR: &str = "apify~instagram-scraper";

/// Desktop browser UA sent by the image proxy so Instagram's CDN serves the asset.
pub const DEFAULT_PROXY_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Host suffixes the image proxy is willing to fetch from.
pub const DEFAULT_PROXY_ALLOWED_HOSTS: &str = "cdninstagram.com,fbcdn.net,instagram.com,facebook.com";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_secs = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(secs)
    };

    let apify_api_token = require("APIFY_API_TOKEN")?;
    let env = parse_environment(&or_default("ADVIZE_ENV", "development"))?;

    let bind_addr = parse_addr("ADVIZE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ADVIZE_LOG_LEVEL", "info");

    let apify_base_url = or_default("APIFY_BASE_URL", DEFAULT_APIFY_BASE_URL);
    let instagram_actor = or_default("ADVIZE_INSTAGRAM_ACTOR", DEFAULT_INSTAGRAM_ACTOR);

    let scrape_timeout_secs = parse_secs("ADVIZE_SCRAPE_TIMEOUT_SECS", "180")?;
    let run_wait_secs = parse_secs("ADVIZE_RUN_WAIT_SECS", "60")?;
    let http_timeout_secs = parse_secs("ADVIZE_HTTP_TIMEOUT_SECS", "90")?;
    let proxy_timeout_secs = parse_secs("ADVIZE_PROXY_TIMEOUT_SECS", "15")?;

    // Apify holds the connection open for up to `waitForFinish` seconds; a
    // shorter client timeout would abort every long-poll.
    if http_timeout_secs <= run_wait_secs {
        return Err(ConfigError::InvalidEnvVar {
            var: "ADVIZE_HTTP_TIMEOUT_SECS".to_string(),
            reason: format!("must exceed ADVIZE_RUN_WAIT_SECS ({run_wait_secs})"),
        });
    }

    let proxy_user_agent = or_default("ADVIZE_PROXY_USER_AGENT", DEFAULT_PROXY_USER_AGENT);
    let proxy_allowed_hosts = parse_host_list(&or_default(
        "ADVIZE_PROXY_ALLOWED_HOSTS",
        DEFAULT_PROXY_ALLOWED_HOSTS,
    ));
    if proxy_allowed_hosts.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "ADVIZE_PROXY_ALLOWED_HOSTS".to_string(),
            reason: "at least one host is required".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        apify_api_token,
        apify_base_url,
        instagram_actor,
        scrape_timeout_secs,
        run_wait_secs,
        http_timeout_secs,
        proxy_timeout_secs,
        proxy_user_agent,
        proxy_allowed_hosts,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ADVIZE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Splits a comma-separated host list, lower-casing entries and dropping
/// blanks and leading dots.
fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
