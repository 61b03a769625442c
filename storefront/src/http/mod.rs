//! HTTP transport seam: request/response values and the [`HttpClient`] trait.
//!
//! Everything above this module (retry, limiter, fetchers) talks to the network only
//! through `Arc<dyn HttpClient>`, so tests substitute a scripted client.

mod mock;
mod reqwest_client;

pub use mock::MockHttpClient;
pub use reqwest_client::ReqwestHttpClient;

use async_trait::async_trait;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One outbound request. GET parameters are already encoded into `url`;
/// POST parameters travel as an `application/x-www-form-urlencoded` body.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    /// GET with query-string parameters.
    pub fn get(mut url: Url, query: &[(&str, &str)]) -> Self {
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Self {
            method: Method::Get,
            url,
            form: Vec::new(),
        }
    }

    /// POST with a form-encoded body (empty `form` sends no body).
    pub fn post_form(url: Url, form: &[(&str, &str)]) -> Self {
        Self {
            method: Method::Post,
            url,
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Value of a form field, if present.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and raw body text. Bodies are classified later (rate limit marker, JSON).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// HTTP 429 Too Many Requests.
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Sends one request. Abstraction for testing.
///
/// Non-2xx statuses are returned as `Ok`; `Err` means the request never produced a
/// response (connection refused, timeout, TLS), carrying a human-readable message.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_encodes_query_pairs() {
        let url = Url::parse("https://api.example.com/v1/fetch-brands").unwrap();
        let req = HttpRequest::get(url, &[("business_id", "42 7")]);
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url.query(), Some("business_id=42+7"));
        assert!(req.form.is_empty());
    }

    #[test]
    fn post_form_keeps_field_order() {
        let url = Url::parse("https://api.example.com/v1/save-settings").unwrap();
        let req = HttpRequest::post_form(url, &[("brand_id", "7"), ("theme_type", "web")]);
        assert_eq!(req.form_value("theme_type"), Some("web"));
        assert_eq!(req.form[0].0, "brand_id");
        assert_eq!(req.url.query(), None);
    }

    #[test]
    fn response_status_helpers() {
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(429, "Too Many Requests").is_success());
        assert!(HttpResponse::new(429, "").is_rate_limited());
    }
}
