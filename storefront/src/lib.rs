//! # Storefront
//!
//! Client-side settings layer for a storefront theme editor. Fetches a brand's business
//! info, theme blobs and catalog data from the upstream theme API and keeps them in one
//! reactive [`Settings`] view model.
//!
//! ## Request pipeline
//!
//! Every upstream call made by [`SettingsClient`] goes through the same stages:
//!
//! - [`ResponseCache`]: 30s TTL, keyed `<resource>_<id>`; hits skip the network.
//! - [`RequestLimiter`]: at most 3 calls in flight, the rest wait in FIFO order.
//! - [`fetch_with_retry`]: exponential backoff on 429 and transport errors.
//! - Body classification: `Too Many Requests` marker, JSON parse, `{result|data}` envelope.
//!
//! ## Main modules
//!
//! - [`aggregator`]: [`SettingsSource`]; business info first, then the data the active
//!   panel ([`ActiveClass`]) needs, concurrently.
//! - [`store`]: [`SettingsStore`] with reentrancy guard, debounce, stale-result drop and the
//!   login redirect ([`Navigator`]).
//! - [`session`]: cookie + local storage identity ([`Session`], [`MemorySession`], [`FileSession`]).
//! - [`theme`]: [`WebTheme`] sections and header normalization.
//! - [`purge`]: [`purge_cache`], which rebuilds home sections after an upstream purge.
//! - [`http`]: [`HttpClient`] seam with [`ReqwestHttpClient`] and [`MockHttpClient`].
//! - [`config`]: [`ClientConfig`] from `STOREFRONT_*` environment variables.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront::{
//!     ActiveClass, ClientConfig, FileSession, NoopNavigator, SettingsClient, SettingsStore,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load(None)?;
//! let client = Arc::new(SettingsClient::from_config(&config)?);
//! let session = Arc::new(FileSession::open("session.json"));
//! let store = SettingsStore::from_config(client, session, Arc::new(NoopNavigator), &config);
//! store.set_active_class(Some(ActiveClass::HomeSections));
//! let outcome = store.refresh_settings().await;
//! println!("{:?}: {:?}", outcome, store.settings().business_logo);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod limiter;
pub mod purge;
pub mod retry;
pub mod session;
pub mod settings;
pub mod store;
pub mod theme;

pub use aggregator::SettingsSource;
pub use api::{SettingsClient, ThemeType};
pub use cache::{ResponseCache, DEFAULT_CACHE_TTL};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use http::{HttpClient, HttpRequest, HttpResponse, MockHttpClient, ReqwestHttpClient};
pub use limiter::{RequestLimiter, DEFAULT_MAX_CONCURRENT};
pub use purge::{purge_cache, PurgeReport};
pub use retry::{fetch_with_retry, RetryPolicy};
pub use session::{FileSession, MemorySession, Session};
pub use settings::{ActiveClass, ApiStatus, BusinessInfo, ProductsPage, Settings};
pub use store::{
    Navigator, NoopNavigator, RefreshOutcome, RefreshPhase, SettingsStore, SkipReason, View,
    DEFAULT_MIN_REFRESH_INTERVAL,
};
pub use theme::{HeaderConfig, HomeConfig, ThemeSection, WebTheme};
