//! Error type for upstream API access.

/// Errors from the theme API pipeline (transport, retry, parse, preconditions).
///
/// **Interaction**: Returned by every `SettingsClient` fetcher and by
/// `SettingsSource::fetch_all_settings`; the settings store turns it into the
/// user-visible `error` / `apiStatus` fields instead of propagating it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Connection, TLS or timeout failure after retries were exhausted.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-2xx response whose body was not usable JSON.
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    /// Upstream answered with a "Too Many Requests" body.
    #[error("rate limited by upstream (Too Many Requests)")]
    RateLimited,
    /// Body was not valid JSON or did not have the expected shape.
    #[error("invalid response body: {0}")]
    Parse(String),
    /// No brand identifier in cookies or local storage.
    #[error("not logged in")]
    NotLoggedIn,
    /// Business info carried no business id, so business-scoped endpoints cannot be called.
    #[error("business info has no business id")]
    MissingBusinessId,
    /// The request limiter was shut down while a caller was queued.
    #[error("request limiter closed")]
    LimiterClosed,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether this error came from upstream rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited) || matches!(self, ApiError::Status { status: 429, .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Parse(e.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        ApiError::InvalidUrl(e.to_string())
    }
}
