//! Load `$XDG_CONFIG_HOME/<app>/config.toml`.
//!
//! Two tables are recognised:
//!
//! ```toml
//! [client]
//! api_base_url = "https://api.example.com/v1/"
//! cache_ttl_ms = 30000
//!
//! [env]
//! RUST_LOG = "storefront=debug"
//! ```
//!
//! `[client]` keys are mapped to `STOREFRONT_*` variables; `[env]` entries are taken verbatim
//! and win over `[client]` when both name the same variable.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::LoadError;

fn xdg_config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into()))?;
    let path = config_dir.join(app_name).join("config.toml");
    Ok(path.exists().then_some(path))
}

/// Typed `[client]` table.
#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
struct ClientTable {
    api_base_url: Option<String>,
    cache_ttl_ms: Option<u64>,
    max_concurrent: Option<usize>,
    min_refresh_interval_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    session_file: Option<String>,
}

impl ClientTable {
    fn into_env(self) -> HashMap<String, String> {
        let pairs = [
            ("STOREFRONT_API_BASE_URL", self.api_base_url),
            ("STOREFRONT_CACHE_TTL_MS", self.cache_ttl_ms.map(|v| v.to_string())),
            ("STOREFRONT_MAX_CONCURRENT", self.max_concurrent.map(|v| v.to_string())),
            (
                "STOREFRONT_MIN_REFRESH_INTERVAL_MS",
                self.min_refresh_interval_ms.map(|v| v.to_string()),
            ),
            (
                "STOREFRONT_REQUEST_TIMEOUT_SECS",
                self.request_timeout_secs.map(|v| v.to_string()),
            ),
            ("STOREFRONT_SESSION_FILE", self.session_file),
        ];
        pairs
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
            .collect()
    }
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    client: ClientTable,
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Returns env key-value pairs from `[client]` and `[env]`. Missing file returns an empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = xdg_config_path(app_name)? else {
        return Ok(HashMap::new());
    };
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    let mut out = config.client.into_env();
    out.extend(config.env);
    Ok(out)
}
