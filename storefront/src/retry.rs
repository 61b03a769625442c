//! Retry fetcher: bounded exponential backoff on `429` and transport failures.
//!
//! Every logical call runs its own retry budget; there is no shared circuit breaker.

use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::ApiError;
use crate::http::{HttpClient, HttpRequest, HttpResponse};

/// How many times to retry and how long to wait before the first retry.
///
/// The wait doubles after every retry (`initial_backoff`, `initial_backoff * 2`, ...).
/// When `jitter` is non-zero a uniform random delay in `0..=jitter` is added to each wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Wait before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound of the random delay added to each wait.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    /// Policy without jitter.
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            jitter: Duration::ZERO,
        }
    }

    /// Business info, save and purge: 5 retries from 500ms, jittered.
    pub fn critical() -> Self {
        Self::new(5, Duration::from_millis(500)).with_jitter(Duration::from_millis(100))
    }

    /// Catalog lookups: 3 retries from 300ms, jittered.
    pub fn light() -> Self {
        Self::new(3, Duration::from_millis(300)).with_jitter(Duration::from_millis(50))
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Backoff before retry number `retry` (0-based), without jitter.
    pub fn delay(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry))
    }

    fn jitter_sample(&self) -> Duration {
        if self.jitter.is_zero() {
            return Duration::ZERO;
        }
        let max = self.jitter.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}

/// Sends `request`, retrying on `429` or transport failure while the budget lasts.
///
/// When retries are exhausted the last outcome is surfaced unchanged: a final `429`
/// comes back as `Ok(response)` for the caller to classify, a final transport failure
/// as [`ApiError::Transport`]. Other statuses are never retried.
pub async fn fetch_with_retry(
    client: &dyn HttpClient,
    request: &HttpRequest,
    policy: &RetryPolicy,
) -> Result<HttpResponse, ApiError> {
    let mut retry = 0;
    loop {
        let outcome = client.send(request).await;
        let retryable = match &outcome {
            Ok(response) => response.is_rate_limited(),
            Err(_) => true,
        };
        if !retryable || retry >= policy.max_retries {
            return outcome.map_err(ApiError::Transport);
        }

        let wait = policy.delay(retry) + policy.jitter_sample();
        match &outcome {
            Ok(response) => warn!(
                url = %request.url,
                status = response.status,
                retry = retry + 1,
                wait_ms = wait.as_millis() as u64,
                "rate limited, backing off"
            ),
            Err(e) => warn!(
                url = %request.url,
                error = %e,
                retry = retry + 1,
                wait_ms = wait.as_millis() as u64,
                "request failed, backing off"
            ),
        }
        tokio::time::sleep(wait).await;
        retry += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpClient;
    use url::Url;

    fn request() -> HttpRequest {
        let url = Url::parse("https://api.example.com/v1/fetch-business-settings").unwrap();
        HttpRequest::post_form(url, &[("brand_id", "7")])
    }

    #[test]
    fn delay_doubles_each_retry() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_millis(1000));
        assert_eq!(policy.delay(2), Duration::from_millis(2000));
    }

    #[test]
    fn named_policies() {
        assert_eq!(RetryPolicy::default().max_retries, 3);
        assert_eq!(RetryPolicy::default().jitter, Duration::ZERO);
        assert_eq!(RetryPolicy::critical().max_retries, 5);
        assert_eq!(RetryPolicy::light().initial_backoff, Duration::from_millis(300));
    }

    #[test]
    fn jitter_stays_within_bound() {
        let policy = RetryPolicy::new(1, Duration::ZERO).with_jitter(Duration::from_millis(20));
        for _ in 0..100 {
            assert!(policy.jitter_sample() <= Duration::from_millis(20));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn two_429s_then_200_retries_twice_with_doubling_backoff() {
        let http = MockHttpClient::new()
            .reply("fetch-business-settings", 429, "Too Many Requests")
            .reply("fetch-business-settings", 429, "Too Many Requests")
            .reply("fetch-business-settings", 200, "{}");
        let policy = RetryPolicy::new(3, Duration::from_millis(500));

        let response = fetch_with_retry(&http, &request(), &policy).await.unwrap();
        assert_eq!(response.status, 200);

        let times = http.call_times("fetch-business-settings");
        assert_eq!(times.len(), 3);
        assert_eq!(times[1] - times[0], Duration::from_millis(500));
        assert_eq!(times[2] - times[1], Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_429_returns_last_response() {
        let http = MockHttpClient::new().reply("fetch-business-settings", 429, "Too Many Requests");
        let policy = RetryPolicy::new(2, Duration::from_millis(10));

        let response = fetch_with_retry(&http, &request(), &policy).await.unwrap();
        assert_eq!(response.status, 429);
        assert_eq!(http.calls("fetch-business-settings"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_transport_failure_is_an_error() {
        let http = MockHttpClient::new().fail("fetch-business-settings", "connection refused");
        let policy = RetryPolicy::new(1, Duration::from_millis(10));

        let err = fetch_with_retry(&http, &request(), &policy).await.unwrap_err();
        assert_eq!(err, ApiError::Transport("connection refused".into()));
        assert_eq!(http.calls("fetch-business-settings"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_then_success_recovers() {
        let http = MockHttpClient::new()
            .fail("fetch-business-settings", "reset by peer")
            .reply("fetch-business-settings", 200, "{\"ok\":true}");

        let response = fetch_with_retry(&http, &request(), &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(response.body, "{\"ok\":true}");
        assert_eq!(http.calls("fetch-business-settings"), 2);
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let http = MockHttpClient::new().reply("fetch-business-settings", 500, "boom");

        let response = fetch_with_retry(&http, &request(), &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(http.calls("fetch-business-settings"), 1);
    }
}
