//! Load configuration from XDG `config.toml` and project `.env`, then apply to the process
//! environment with priority: **existing env > .env > XDG**.
//!
//! The storefront client reads its settings from `STOREFRONT_*` variables afterwards, so every
//! source (shell, `.env`, `[client]`/`[env]` tables) ends up in one place.

mod dotenv;
mod xdg_toml;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(String),
}

/// Loads config from XDG `config.toml` and optional project `.env`, then sets environment
/// variables only for keys that are **not** already set.
///
/// Order of precedence when a key is missing in the process environment:
/// 1. Value from project `.env` (current directory or `override_dir` if given)
/// 2. Value from `$XDG_CONFIG_HOME/<app_name>/config.toml` (`[env]`, then `[client]`)
///
/// Returns the keys that were applied.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<Vec<String>, LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir)?;

    let keys: HashSet<&String> = xdg_map.keys().chain(dotenv_map.keys()).collect();
    let mut applied = Vec::new();
    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(v) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, v);
            applied.push(key.clone());
        }
    }
    applied.sort();
    Ok(applied)
}

/// Per-user data directory for `app_name` (e.g. `~/.local/share/storefront`).
pub fn data_dir(app_name: &str) -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(app_name))
}
