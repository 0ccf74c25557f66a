//! Application configuration loading from environment variables.
//!
//! Configuration is read once at startup and handed to the server explicitly;
//! nothing reads the environment after `main` has built the router. A `.env`
//! file is honoured through `dotenvy`.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `RUST_LOG`: Logging level (default: "info,qr_relay=debug,tower_http=debug")
//! - `HOST`: Server bind address (default: "0.0.0.0")
//! - `PORT`: Server port (default: 8000)
//! - `UPLOAD_URL`: Upstream upload endpoint
//! - `DECODE_URL`: Upstream QR detection endpoint
//! - `UPSTREAM_TIMEOUT_SECS`: Timeout for each upstream call (default: 30)
//! - `MAX_UPLOAD_BYTES`: Largest accepted request body (default: 20 MiB)
//! - `BROWSER_USER_AGENT`, `BROWSER_ORIGIN`, `BROWSER_REFERER`,
//!   `BROWSER_ACCEPT_LANGUAGE`: Browser identity presented upstream
//! - `ALLOWED_ORIGINS`: Comma-separated CORS origins for release builds

use crate::infrastructure::upstream::{
    cliim_client::{DEFAULT_DECODE_URL, DEFAULT_UPLOAD_URL},
    headers::{self, BrowserProfile},
};
use std::time::Duration;

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Multipart upload endpoint of the recognition service
    pub upload_url: String,

    /// Form-encoded decode endpoint of the recognition service
    pub decode_url: String,

    /// Upper bound for each outbound call, connect to last body byte
    pub upstream_timeout: Duration,

    /// Largest inbound request body accepted
    pub max_upload_bytes: usize,

    /// Headers that make outbound calls look like the upstream's own web page
    pub browser: BrowserProfile,

    /// CORS origins allowed in release builds
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            decode_url: DEFAULT_DECODE_URL.to_string(),
            upstream_timeout: Duration::from_secs(30),
            max_upload_bytes: 20 * 1024 * 1024,
            browser: BrowserProfile::default(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed to the
    /// expected type.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: env_or("HOST", defaults.host)?,
            port: env_or("PORT", defaults.port)?,
            upload_url: env_or("UPLOAD_URL", defaults.upload_url)?,
            decode_url: env_or("DECODE_URL", defaults.decode_url)?,
            upstream_timeout: Duration::from_secs(env_or(
                "UPSTREAM_TIMEOUT_SECS",
                defaults.upstream_timeout.as_secs(),
            )?),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            browser: BrowserProfile {
                user_agent: env_or("BROWSER_USER_AGENT", headers::DEFAULT_USER_AGENT.to_string())?,
                origin: env_or("BROWSER_ORIGIN", headers::DEFAULT_ORIGIN.to_string())?,
                referer: env_or("BROWSER_REFERER", headers::DEFAULT_REFERER.to_string())?,
                accept_language: env_or(
                    "BROWSER_ACCEPT_LANGUAGE",
                    headers::DEFAULT_ACCEPT_LANGUAGE.to_string(),
                )?,
            },
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load an environment variable with a default value.
///
/// Returns the parsed environment variable if set, otherwise returns the default.
///
/// # Errors
///
/// Returns an error if the variable is set but cannot be parsed.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
