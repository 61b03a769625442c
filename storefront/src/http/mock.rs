//! Scripted in-memory [`HttpClient`] for tests and offline runs.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{HttpClient, HttpRequest, HttpResponse};

type Reply = Result<HttpResponse, String>;

#[derive(Default)]
struct Route {
    replies: VecDeque<Reply>,
    last: Option<Reply>,
    delay: Duration,
}

#[derive(Default)]
struct Inner {
    routes: HashMap<String, Route>,
    calls: Vec<(String, Instant, HttpRequest)>,
}

/// Mock client keyed by the last URL path segment (e.g. `fetch-products`).
///
/// Replies queued for a route are consumed in order; once the queue is drained the last
/// reply repeats. Unscripted routes answer `404`. Every request is recorded with the
/// (tokio) instant it arrived, so tests can assert call counts and backoff spacing.
///
/// ## Example
///
/// ```rust,ignore
/// let http = MockHttpClient::new()
///     .reply("fetch-business-settings", 429, "Too Many Requests")
///     .reply_json("fetch-business-settings", json!({"result": {"business_id": 9}}));
/// ```
#[derive(Default)]
pub struct MockHttpClient {
    inner: Mutex<Inner>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, route: &str, reply: Reply) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner
                .routes
                .entry(route.to_string())
                .or_default()
                .replies
                .push_back(reply);
        }
        self
    }

    /// Queue a response with the given status and body.
    pub fn reply(self, route: &str, status: u16, body: impl Into<String>) -> Self {
        self.push(route, Ok(HttpResponse::new(status, body)))
    }

    /// Queue a `200` with a JSON body.
    pub fn reply_json(self, route: &str, body: serde_json::Value) -> Self {
        self.push(route, Ok(HttpResponse::new(200, body.to_string())))
    }

    /// Queue a transport failure.
    pub fn fail(self, route: &str, message: &str) -> Self {
        self.push(route, Err(message.to_string()))
    }

    /// Hold every response on this route for `delay` before answering.
    pub fn delay(self, route: &str, delay: Duration) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.routes.entry(route.to_string()).or_default().delay = delay;
        }
        self
    }

    /// Number of requests received on `route`.
    pub fn calls(&self, route: &str) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.calls.iter().filter(|(r, _, _)| r == route).count())
            .unwrap_or(0)
    }

    /// Arrival instants of requests on `route`, oldest first.
    pub fn call_times(&self, route: &str) -> Vec<Instant> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .calls
                    .iter()
                    .filter(|(r, _, _)| r == route)
                    .map(|(_, at, _)| *at)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All recorded requests in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner
            .lock()
            .map(|inner| inner.calls.iter().map(|(_, _, req)| req.clone()).collect())
            .unwrap_or_default()
    }
}

fn route_of(request: &HttpRequest) -> String {
    request
        .url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let route = route_of(request);
        let (reply, delay) = {
            let mut inner = self
                .inner
                .lock()
                .map_err(|_| "mock client poisoned".to_string())?;
            inner
                .calls
                .push((route.clone(), Instant::now(), request.clone()));
            match inner.routes.get_mut(&route) {
                Some(r) => {
                    if let Some(next) = r.replies.pop_front() {
                        r.last = Some(next);
                    }
                    let reply = r
                        .last
                        .clone()
                        .unwrap_or_else(|| Ok(HttpResponse::new(404, "not found")));
                    (reply, r.delay)
                }
                None => (Ok(HttpResponse::new(404, "not found")), Duration::ZERO),
            }
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}
