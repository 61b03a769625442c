//! Reqwest-based [`HttpClient`].

use std::time::Duration;

use async_trait::async_trait;

use super::{HttpClient, HttpRequest, HttpResponse, Method};
use crate::error::ApiError;

/// Production transport. One pooled `reqwest::Client` per instance.
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build with an optional whole-request timeout (`None` waits indefinitely).
    pub fn new(timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post if request.form.is_empty() => self.client.post(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()).form(&request.form),
        };
        let response = builder.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| e.to_string())?;
        Ok(HttpResponse { status, body })
    }
}
