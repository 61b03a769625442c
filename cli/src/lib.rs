//! Command implementations behind the `storefront` binary.
//!
//! Each command takes its collaborators (client, session) as arguments so it can run
//! against a scripted upstream in tests; `main.rs` only parses arguments and wires the
//! production client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use storefront::config::resolve_session_path;
use storefront::session;
use storefront::theme::ThemeError;
use storefront::{
    purge_cache, ActiveClass, ApiError, ClientConfig, ConfigError, FileSession, Navigator, PurgeReport,
    RefreshOutcome, Session, Settings, SettingsClient, SettingsStore, ThemeType, View, WebTheme,
};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Theme(#[from] ThemeError),
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no session file location; pass --session or set STOREFRONT_SESSION_FILE")]
    NoSessionPath,
    #[error("not logged in; run `storefront login --brand-id <ID>`")]
    NotLoggedIn,
    #[error("no user id in session; run `storefront login --brand-id <ID> --user-id <ID>`")]
    MissingUserId,
    #[error("refresh failed: {0}")]
    Refresh(String),
}

/// Opens the session file at `explicit`, `STOREFRONT_SESSION_FILE`, or the data directory.
pub fn open_session(explicit: Option<PathBuf>) -> Result<Arc<FileSession>, CliError> {
    let path = resolve_session_path(explicit).ok_or(CliError::NoSessionPath)?;
    Ok(Arc::new(FileSession::open(path)))
}

pub fn login(session: &dyn Session, brand_id: &str, user_id: Option<&str>) {
    session::log_in(session, brand_id, user_id);
    info!(brand_id, "logged in");
}

pub fn logout(session: &dyn Session) {
    session::log_out(session);
    info!("logged out");
}

/// Navigator for the terminal: a login redirect becomes a warning.
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, to: View) {
        warn!(view = %to, "redirect requested");
    }
}

/// Runs one store refresh for the logged-in brand and returns the resulting settings.
///
/// `NotLoggedIn` and `Failed` outcomes become errors so the binary exits non-zero.
pub async fn refresh(
    config: &ClientConfig,
    client: Arc<SettingsClient>,
    session: Arc<dyn Session>,
    active_class: Option<ActiveClass>,
    view: View,
) -> Result<Settings, CliError> {
    let store = SettingsStore::from_config(client, session, Arc::new(TerminalNavigator), config);
    store.set_view(view);
    store.set_active_class(active_class);
    match store.refresh_settings().await {
        RefreshOutcome::Applied => Ok(store.settings()),
        RefreshOutcome::NotLoggedIn => Err(CliError::NotLoggedIn),
        RefreshOutcome::Failed(message) => Err(CliError::Refresh(message)),
        other => Err(CliError::Refresh(format!("refresh not applied: {:?}", other))),
    }
}

/// Reads a theme JSON file, validates it as a [`WebTheme`] and saves it upstream.
pub async fn save(
    client: &SettingsClient,
    session: &dyn Session,
    theme_type: ThemeType,
    file: &Path,
) -> Result<Value, CliError> {
    let brand_id = session::brand_id(session).ok_or(CliError::NotLoggedIn)?;
    let user_id = session::user_id(session).ok_or(CliError::MissingUserId)?;
    let theme = read_theme(file)?;
    Ok(client
        .save_settings(&brand_id, &user_id, theme_type, &theme)
        .await?)
}

pub async fn purge(client: &SettingsClient, session: &dyn Session) -> Result<PurgeReport, CliError> {
    let brand_id = session::brand_id(session).ok_or(CliError::NotLoggedIn)?;
    let user_id = session::user_id(session).ok_or(CliError::MissingUserId)?;
    Ok(purge_cache(client, &brand_id, &user_id).await?)
}

fn read_theme(file: &Path) -> Result<WebTheme, CliError> {
    let text = std::fs::read_to_string(file).map_err(|source| CliError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: file.to_path_buf(),
        source,
    })?;
    let mut theme = WebTheme::from_blob(&value)?;
    theme.normalize();
    Ok(theme)
}
