//! Session storage: the cookie jar and local storage the settings store reads identity
//! and the offline header config from.
//!
//! The brand id lives in two places: cookies (readable by the server) and local storage
//! (readable by the client). [`brand_id`] checks cookies first, falls back to local
//! storage, and backfills the cookie when only local storage had it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const BRAND_ID_COOKIE: &str = "brand_id";
pub const USER_ID_COOKIE: &str = "user_id";
pub const BRAND_ID_ITEM: &str = "brandId";
pub const USER_ID_ITEM: &str = "userId";
/// Local-storage key of the JSON-serialized header config (offline fallback).
pub const HEADER_CONFIG_ITEM: &str = "headerConfig";

/// Cookie jar + local storage. Implementations must be cheap and non-blocking.
pub trait Session: Send + Sync {
    fn cookie(&self, name: &str) -> Option<String>;
    fn set_cookie(&self, name: &str, value: &str);
    fn remove_cookie(&self, name: &str);
    fn local_item(&self, key: &str) -> Option<String>;
    fn set_local_item(&self, key: &str, value: &str);
    fn remove_local_item(&self, key: &str);
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

fn identity(session: &dyn Session, cookie: &str, item: &str) -> Option<String> {
    if let Some(id) = non_empty(session.cookie(cookie)) {
        return Some(id);
    }
    let id = non_empty(session.local_item(item))?;
    session.set_cookie(cookie, &id);
    Some(id)
}

/// Brand id from cookies, else local storage (backfilling the cookie).
pub fn brand_id(session: &dyn Session) -> Option<String> {
    identity(session, BRAND_ID_COOKIE, BRAND_ID_ITEM)
}

/// User id from cookies, else local storage (backfilling the cookie).
pub fn user_id(session: &dyn Session) -> Option<String> {
    identity(session, USER_ID_COOKIE, USER_ID_ITEM)
}

/// Whether a brand is logged in. Does not backfill.
pub fn is_logged_in(session: &dyn Session) -> bool {
    non_empty(session.cookie(BRAND_ID_COOKIE)).is_some()
        || non_empty(session.local_item(BRAND_ID_ITEM)).is_some()
}

/// Stores identity in both cookies and local storage.
pub fn log_in(session: &dyn Session, brand_id: &str, user_id: Option<&str>) {
    session.set_cookie(BRAND_ID_COOKIE, brand_id);
    session.set_local_item(BRAND_ID_ITEM, brand_id);
    if let Some(user_id) = user_id {
        session.set_cookie(USER_ID_COOKIE, user_id);
        session.set_local_item(USER_ID_ITEM, user_id);
    }
}

/// Clears identity and the offline header config.
pub fn log_out(session: &dyn Session) {
    session.remove_cookie(BRAND_ID_COOKIE);
    session.remove_cookie(USER_ID_COOKIE);
    session.remove_local_item(BRAND_ID_ITEM);
    session.remove_local_item(USER_ID_ITEM);
    session.remove_local_item(HEADER_CONFIG_ITEM);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SessionData {
    #[serde(default)]
    cookies: HashMap<String, String>,
    #[serde(default)]
    local_storage: HashMap<String, String>,
}

impl SessionData {
    fn apply(&mut self, op: Op<'_>) {
        match op {
            Op::SetCookie(k, v) => {
                self.cookies.insert(k.to_string(), v.to_string());
            }
            Op::RemoveCookie(k) => {
                self.cookies.remove(k);
            }
            Op::SetItem(k, v) => {
                self.local_storage.insert(k.to_string(), v.to_string());
            }
            Op::RemoveItem(k) => {
                self.local_storage.remove(k);
            }
        }
    }
}

enum Op<'a> {
    SetCookie(&'a str, &'a str),
    RemoveCookie(&'a str),
    SetItem(&'a str, &'a str),
    RemoveItem(&'a str),
}

/// In-memory session. Lost when dropped.
#[derive(Debug, Default)]
pub struct MemorySession {
    data: Mutex<SessionData>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut SessionData) -> T) -> T {
        let mut guard = self.data.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl Session for MemorySession {
    fn cookie(&self, name: &str) -> Option<String> {
        self.with(|d| d.cookies.get(name).cloned())
    }

    fn set_cookie(&self, name: &str, value: &str) {
        self.with(|d| d.apply(Op::SetCookie(name, value)))
    }

    fn remove_cookie(&self, name: &str) {
        self.with(|d| d.apply(Op::RemoveCookie(name)))
    }

    fn local_item(&self, key: &str) -> Option<String> {
        self.with(|d| d.local_storage.get(key).cloned())
    }

    fn set_local_item(&self, key: &str, value: &str) {
        self.with(|d| d.apply(Op::SetItem(key, value)))
    }

    fn remove_local_item(&self, key: &str) {
        self.with(|d| d.apply(Op::RemoveItem(key)))
    }
}

/// Session persisted as a JSON file, written through on every mutation.
///
/// A missing or unreadable file starts an empty session; write failures are logged and
/// the in-memory copy stays authoritative for this process.
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    data: Mutex<SessionData>,
}

impl FileSession {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "session file is not valid JSON, starting empty");
                SessionData::default()
            }),
            Err(_) => SessionData::default(),
        };
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&SessionData) -> T) -> T {
        let guard = self.data.lock().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    fn mutate(&self, op: Op<'_>) {
        let mut guard = self.data.lock().unwrap_or_else(|e| e.into_inner());
        guard.apply(op);
        if let Err(e) = self.persist(&guard) {
            warn!(path = %self.path.display(), error = %e, "failed to persist session");
        }
    }

    fn persist(&self, data: &SessionData) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, text)
    }
}

impl Session for FileSession {
    fn cookie(&self, name: &str) -> Option<String> {
        self.read(|d| d.cookies.get(name).cloned())
    }

    fn set_cookie(&self, name: &str, value: &str) {
        self.mutate(Op::SetCookie(name, value))
    }

    fn remove_cookie(&self, name: &str) {
        self.mutate(Op::RemoveCookie(name))
    }

    fn local_item(&self, key: &str) -> Option<String> {
        self.read(|d| d.local_storage.get(key).cloned())
    }

    fn set_local_item(&self, key: &str, value: &str) {
        self.mutate(Op::SetItem(key, value))
    }

    fn remove_local_item(&self, key: &str) {
        self.mutate(Op::RemoveItem(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_wins_over_local_storage() {
        let session = MemorySession::new();
        session.set_cookie(BRAND_ID_COOKIE, "1");
        session.set_local_item(BRAND_ID_ITEM, "2");
        assert_eq!(brand_id(&session).as_deref(), Some("1"));
    }

    #[test]
    fn local_storage_fallback_backfills_cookie() {
        let session = MemorySession::new();
        session.set_local_item(BRAND_ID_ITEM, "7");
        assert!(session.cookie(BRAND_ID_COOKIE).is_none());

        assert_eq!(brand_id(&session).as_deref(), Some("7"));
        assert_eq!(session.cookie(BRAND_ID_COOKIE).as_deref(), Some("7"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let session = MemorySession::new();
        session.set_cookie(BRAND_ID_COOKIE, " ");
        assert!(!is_logged_in(&session));
        assert_eq!(brand_id(&session), None);
    }

    #[test]
    fn log_in_and_out() {
        let session = MemorySession::new();
        log_in(&session, "7", Some("99"));
        session.set_local_item(HEADER_CONFIG_ITEM, "{}");
        assert!(is_logged_in(&session));
        assert_eq!(user_id(&session).as_deref(), Some("99"));

        log_out(&session);
        assert!(!is_logged_in(&session));
        assert_eq!(session.local_item(HEADER_CONFIG_ITEM), None);
    }

    #[test]
    fn file_session_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        {
            let session = FileSession::open(&path);
            log_in(&session, "7", None);
            session.set_local_item(HEADER_CONFIG_ITEM, r#"{"nav":[]}"#);
        }
        let reopened = FileSession::open(&path);
        assert_eq!(reopened.cookie(BRAND_ID_COOKIE).as_deref(), Some("7"));
        assert_eq!(
            reopened.local_item(HEADER_CONFIG_ITEM).as_deref(),
            Some(r#"{"nav":[]}"#)
        );
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{{{").unwrap();
        let session = FileSession::open(&path);
        assert!(!is_logged_in(&session));
    }
}
