//! Reactive settings store.
//!
//! [`SettingsStore`] owns the current [`Settings`] and publishes every change through a
//! `tokio::sync::watch` channel. [`SettingsStore::refresh_settings`] is the only writer
//! of fetched data. Guards are evaluated under one lock, in order: login view, a refresh
//! already in flight, then the minimum interval between dispatches.
//!
//! A result is dropped when the active class changed while it was being fetched, so a
//! slow response for one panel never overwrites another panel's data.

mod view;

pub use view::{Navigator, NoopNavigator, View};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::aggregator::SettingsSource;
use crate::config::ClientConfig;
use crate::session::{self, Session, HEADER_CONFIG_ITEM};
use crate::settings::{ActiveClass, ApiStatus, Settings};
use crate::theme::{ThemeSection, WebTheme, HEADER_KEY};

/// Minimum time between two dispatched refreshes.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

const NOT_LOGGED_IN: &str = "Not logged in";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
}

/// Why a refresh was not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    LoginView,
    InFlight,
    Debounced,
}

/// Result of one [`SettingsStore::refresh_settings`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Skipped(SkipReason),
    /// No brand id in cookies or local storage.
    NotLoggedIn,
    Applied,
    /// The active class changed mid-flight; the result was dropped.
    Stale,
    /// The source failed; previous data was kept and `error` set.
    Failed(String),
}

impl RefreshOutcome {
    /// Whether the source was called.
    pub fn dispatched(&self) -> bool {
        matches!(self, Self::Applied | Self::Stale | Self::Failed(_))
    }
}

struct StoreState {
    phase: RefreshPhase,
    last_dispatch: Option<Instant>,
    active_class: Option<ActiveClass>,
    view: View,
    initialized: bool,
}

/// Returns the phase to `Idle` however the refresh ends.
struct PhaseGuard<'a> {
    state: &'a Mutex<StoreState>,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).phase = RefreshPhase::Idle;
    }
}

fn lock(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Admission decision taken under the state lock.
enum Admission {
    Skip(SkipReason),
    Anonymous(View),
    Dispatch(Option<ActiveClass>),
}

/// Holds the current settings and coordinates refreshes.
///
/// **Interaction**: Reads identity from a [`Session`], fetches through a
/// [`SettingsSource`] and asks a [`Navigator`] for the login redirect.
pub struct SettingsStore {
    source: Arc<dyn SettingsSource>,
    session: Arc<dyn Session>,
    navigator: Arc<dyn Navigator>,
    min_refresh_interval: Duration,
    state: Mutex<StoreState>,
    settings: watch::Sender<Settings>,
}

impl SettingsStore {
    pub fn new(
        source: Arc<dyn SettingsSource>,
        session: Arc<dyn Session>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (settings, _) = watch::channel(Settings::default());
        Self {
            source,
            session,
            navigator,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            state: Mutex::new(StoreState {
                phase: RefreshPhase::Idle,
                last_dispatch: None,
                active_class: None,
                view: View::default(),
                initialized: false,
            }),
            settings,
        }
    }

    /// Store honoring the configured minimum refresh interval.
    pub fn from_config(
        source: Arc<dyn SettingsSource>,
        session: Arc<dyn Session>,
        navigator: Arc<dyn Navigator>,
        config: &ClientConfig,
    ) -> Self {
        Self::new(source, session, navigator).with_min_refresh_interval(config.min_refresh_interval)
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    /// Receiver notified on every settings change.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.settings.subscribe()
    }

    pub fn phase(&self) -> RefreshPhase {
        lock(&self.state).phase
    }

    pub fn active_class(&self) -> Option<ActiveClass> {
        lock(&self.state).active_class
    }

    pub fn set_active_class(&self, class: Option<ActiveClass>) {
        lock(&self.state).active_class = class;
    }

    pub fn view(&self) -> View {
        lock(&self.state).view
    }

    pub fn set_view(&self, view: View) {
        lock(&self.state).view = view;
    }

    /// Runs the first refresh once, unless on the login or header view or logged out.
    /// Returns `None` when nothing was attempted.
    pub async fn init(&self) -> Option<RefreshOutcome> {
        {
            let mut state = lock(&self.state);
            if matches!(state.view, View::Login | View::Header) || state.initialized {
                return None;
            }
            if !session::is_logged_in(self.session.as_ref()) {
                return None;
            }
            state.initialized = true;
        }
        Some(self.refresh_settings().await)
    }

    /// Fetches and merges fresh settings for the logged-in brand.
    ///
    /// Never fails: errors land in `Settings::error` / `apiStatus` and in the outcome.
    pub async fn refresh_settings(&self) -> RefreshOutcome {
        let requested = match self.admit() {
            Admission::Skip(reason) => {
                debug!(?reason, "refresh skipped");
                return RefreshOutcome::Skipped(reason);
            }
            Admission::Anonymous(view) => {
                self.apply_not_logged_in(view);
                return RefreshOutcome::NotLoggedIn;
            }
            Admission::Dispatch(class) => class,
        };
        let _idle = PhaseGuard { state: &self.state };

        let Some(brand_id) = session::brand_id(self.session.as_ref()) else {
            // Identity vanished between admission and resolution.
            self.apply_not_logged_in(self.view());
            return RefreshOutcome::NotLoggedIn;
        };
        self.settings.send_modify(|s| s.is_loading = true);
        debug!(brand_id = %brand_id, active_class = ?requested, "refresh dispatched");

        let result = self.source.fetch_all_settings(&brand_id, requested).await;

        if self.active_class() != requested {
            info!(brand_id = %brand_id, requested = ?requested, "active class changed, dropping refresh result");
            self.settings.send_modify(|s| s.is_loading = false);
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(fetched) => {
                self.apply_fetched(fetched);
                info!(brand_id = %brand_id, active_class = ?requested, "settings refreshed");
                RefreshOutcome::Applied
            }
            Err(e) => {
                let message = e.to_string();
                warn!(brand_id = %brand_id, error = %message, "settings refresh failed");
                self.apply_failure(&message);
                RefreshOutcome::Failed(message)
            }
        }
    }

    fn admit(&self) -> Admission {
        let mut state = lock(&self.state);
        if state.view == View::Login {
            return Admission::Skip(SkipReason::LoginView);
        }
        if state.phase == RefreshPhase::Refreshing {
            return Admission::Skip(SkipReason::InFlight);
        }
        let now = Instant::now();
        if let Some(last) = state.last_dispatch {
            if now.duration_since(last) < self.min_refresh_interval {
                return Admission::Skip(SkipReason::Debounced);
            }
        }
        if !session::is_logged_in(self.session.as_ref()) {
            return Admission::Anonymous(state.view);
        }
        state.phase = RefreshPhase::Refreshing;
        state.last_dispatch = Some(now);
        Admission::Dispatch(state.active_class)
    }

    fn apply_fetched(&self, fetched: Settings) {
        let mut header_json = None;
        self.settings.send_modify(|s| {
            s.merge_fetched(fetched);
            if let Some(theme) = s.settings.as_mut() {
                theme.normalize();
                header_json = theme.header_value().map(|h| h.to_string());
            }
            s.is_loading = false;
            s.error = None;
            s.api_status = Some(ApiStatus::ok("Settings loaded"));
            s.last_refreshed = Some(Utc::now());
        });
        if let Some(json) = header_json {
            self.session.set_local_item(HEADER_CONFIG_ITEM, &json);
        }
    }

    fn apply_failure(&self, message: &str) {
        let stored_header = self.stored_header();
        self.settings.send_modify(|s| {
            s.fill_empty_collections();
            s.is_loading = false;
            s.error = Some(message.to_string());
            s.api_status = Some(ApiStatus::failed(message));
            hydrate_header(s, stored_header);
        });
    }

    fn apply_not_logged_in(&self, view: View) {
        info!(view = %view, "no brand logged in");
        let stored_header = self.stored_header();
        self.settings.send_modify(|s| {
            s.clear_brand_data();
            s.is_loading = false;
            s.error = Some(NOT_LOGGED_IN.to_string());
            s.api_status = Some(ApiStatus::failed(NOT_LOGGED_IN));
            hydrate_header(s, stored_header);
        });
        if !view.allows_anonymous() {
            self.set_view(View::Login);
            self.navigator.redirect(View::Login);
        }
    }

    /// Header saved by the last successful refresh, if it is still a JSON object.
    fn stored_header(&self) -> Option<ThemeSection> {
        let raw = self.session.local_item(HEADER_CONFIG_ITEM)?;
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) if value.is_object() => Some(ThemeSection::parse(HEADER_KEY, value)),
            Ok(_) => {
                warn!("stored header config is not an object");
                None
            }
            Err(e) => {
                warn!(error = %e, "stored header config is not valid JSON");
                None
            }
        }
    }
}

/// Installs `stored` as the header when the current theme has none.
fn hydrate_header(settings: &mut Settings, stored: Option<ThemeSection>) {
    let Some(header) = stored else {
        return;
    };
    let theme = settings.settings.get_or_insert_with(WebTheme::new);
    if theme.section(HEADER_KEY).is_none() {
        theme.insert(HEADER_KEY, header);
    }
}
