//! Upstream theme API client.
//!
//! [`SettingsClient`] is constructed once per session and owns the response cache, the
//! request limiter and the retry policies, so every fetch goes through the same pipeline:
//!
//! cache lookup → limiter → retry fetcher → body classification → cache fill.

mod endpoints;
mod fetch;
mod payload;
mod write;

pub use endpoints::Endpoint;
pub use payload::{as_list, parse_body, unwrap_envelope, RATE_LIMIT_MARKER};
pub use write::ThemeType;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::cache::{cache_key, ResponseCache};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::limiter::RequestLimiter;
use crate::retry::{fetch_with_retry, RetryPolicy};

/// Client for the storefront theme API.
///
/// **Interaction**: Implements `SettingsSource` (see `aggregator`) for the settings
/// store; `purge::purge_cache` drives it for cache purges.
pub struct SettingsClient {
    http: Arc<dyn HttpClient>,
    base_url: Url,
    cache: ResponseCache,
    limiter: RequestLimiter,
    critical_retry: RetryPolicy,
    light_retry: RetryPolicy,
}

impl SettingsClient {
    /// Client with default cache TTL (30s), limiter ceiling (3) and retry policies.
    pub fn new(http: Arc<dyn HttpClient>, base_url: Url) -> Self {
        Self {
            http,
            base_url: with_trailing_slash(base_url),
            cache: ResponseCache::default(),
            limiter: RequestLimiter::default(),
            critical_retry: RetryPolicy::critical(),
            light_retry: RetryPolicy::light(),
        }
    }

    /// Production client over reqwest, tuned by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = Arc::new(ReqwestHttpClient::new(config.request_timeout)?);
        Ok(Self::new(http, config.api_base_url.clone())
            .with_cache_ttl(config.cache_ttl)
            .with_max_concurrent(config.max_concurrent))
    }

    pub fn with_cache_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.cache = ResponseCache::new(ttl);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.limiter = RequestLimiter::new(max_concurrent);
        self
    }

    /// Overrides the retry policies (critical: business info and writes; light: catalog).
    pub fn with_retry_policies(mut self, critical: RetryPolicy, light: RetryPolicy) -> Self {
        self.critical_retry = critical;
        self.light_retry = light;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn limiter(&self) -> &RequestLimiter {
        &self.limiter
    }

    fn url(&self, endpoint: Endpoint) -> Result<Url, ApiError> {
        Ok(self.base_url.join(endpoint.path())?)
    }

    /// Runs one request through the pipeline and returns the unwrapped JSON payload.
    ///
    /// `scope` is the identifier the cache key is built from; writes pass `None` and
    /// are never cached.
    async fn request_json(
        &self,
        endpoint: Endpoint,
        request: HttpRequest,
        scope: Option<&str>,
        policy: RetryPolicy,
    ) -> Result<Value, ApiError> {
        let key = endpoint
            .cache_resource()
            .zip(scope)
            .map(|(resource, id)| cache_key(resource, id));

        if let Some(key) = &key {
            if let Some(hit) = self.cache.get(key) {
                debug!(key = %key, "response cache hit");
                return Ok(hit);
            }
            debug!(key = %key, "response cache miss");
        }

        let http = self.http.as_ref();
        let response = self
            .limiter
            .execute(|| fetch_with_retry(http, &request, &policy))
            .await?;
        let data = unwrap_envelope(parse_body(&response)?);

        if let Some(key) = key {
            self.cache.set(key, data.clone());
        }
        Ok(data)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
