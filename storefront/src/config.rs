//! Client configuration resolved from `STOREFRONT_*` environment variables.
//!
//! [`ClientConfig::load`] first applies XDG `config.toml` and `.env` through the `config`
//! crate (existing env > .env > XDG), then reads the variables below.
//!
//! | Variable | Default |
//! |---|---|
//! | `STOREFRONT_API_BASE_URL` | required |
//! | `STOREFRONT_CACHE_TTL_MS` | 30000 |
//! | `STOREFRONT_MAX_CONCURRENT` | 3 |
//! | `STOREFRONT_MIN_REFRESH_INTERVAL_MS` | 5000 |
//! | `STOREFRONT_REQUEST_TIMEOUT_SECS` | 30 (0 disables) |
//! | `STOREFRONT_SESSION_FILE` | `<data dir>/storefront/session.json` |

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::cache::DEFAULT_CACHE_TTL;
use crate::limiter::DEFAULT_MAX_CONCURRENT;
use crate::store::DEFAULT_MIN_REFRESH_INTERVAL;

/// Application name for XDG and data-dir lookups.
pub const APP_NAME: &str = "storefront";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("load config: {0}")]
    Load(#[from] env_config::LoadError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub cache_ttl: Duration,
    pub max_concurrent: usize,
    pub min_refresh_interval: Duration,
    /// `None` disables the per-request timeout.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Defaults for everything except the base URL.
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            cache_ttl: DEFAULT_CACHE_TTL,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Applies XDG/.env config to the environment, then reads it.
    pub fn load(dotenv_dir: Option<&Path>) -> Result<Self, ConfigError> {
        env_config::load_and_apply(APP_NAME, dotenv_dir)?;
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup` (testable without touching the process env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        const BASE_URL: &str = "STOREFRONT_API_BASE_URL";
        let raw_url = lookup(BASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(BASE_URL))?;
        let api_base_url = Url::parse(raw_url.trim()).map_err(|e| ConfigError::Invalid {
            key: BASE_URL,
            value: raw_url.clone(),
            reason: e.to_string(),
        })?;

        let mut config = Self::new(api_base_url);
        if let Some(ms) = parse_var::<u64>(&lookup, "STOREFRONT_CACHE_TTL_MS")? {
            config.cache_ttl = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<usize>(&lookup, "STOREFRONT_MAX_CONCURRENT")? {
            config.max_concurrent = n;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "STOREFRONT_MIN_REFRESH_INTERVAL_MS")? {
            config.min_refresh_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "STOREFRONT_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// `explicit` if given, else `STOREFRONT_SESSION_FILE`, else the per-user data directory.
///
/// Kept out of [`ClientConfig`]: `login` and `logout` need the session without an API URL.
pub fn resolve_session_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    session_path_from(explicit, |key| std::env::var(key).ok())
}

fn session_path_from(
    explicit: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    explicit
        .or_else(|| {
            lookup("STOREFRONT_SESSION_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        })
        .or_else(|| env_config::data_dir(APP_NAME).map(|d| d.join("session.json")))
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: v.clone(),
                reason: e.to_string(),
            }),
    }
}
