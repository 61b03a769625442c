//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use storefront::session::BRAND_ID_COOKIE;
use storefront::{MemorySession, MockHttpClient, RetryPolicy, Session, SettingsClient};
use url::Url;

pub const BASE_URL: &str = "https://themes.example.com/api/";

/// Client over `http` with short backoffs so retry paths stay fast.
pub fn client(http: Arc<MockHttpClient>) -> SettingsClient {
    let quick = RetryPolicy::new(1, Duration::from_millis(10));
    SettingsClient::new(http, Url::parse(BASE_URL).unwrap()).with_retry_policies(quick, quick)
}

/// Business info for business 42 whose header nav is a keyed map.
pub fn business_info() -> Value {
    let theme = json!({
        "header": {
            "nav": {
                "shop": {"label": "Shop", "url": "/shop"},
                "about": {"label": "About", "url": "/about"},
                "contact": {"label": "Contact", "url": "/contact"}
            },
            "bars": [{"list": {"first": {"items": {"x": {"icon": "cart"}}}}}]
        },
        "home": {
            "sections": [
                {"type": "featured_products", "ids": [2, 1], "items": []},
                {"type": "featured_brands", "ids": [7], "items": [{"id": 7, "name": "stale"}]}
            ]
        }
    });
    json!({
        "success": true,
        "result": {
            "business_id": 42,
            "brand_id": "7",
            "business_logo": "https://cdn.example.com/logo.png",
            "web_theme": theme.to_string(),
            "theme_settings": {"primary_color": "#112233"}
        }
    })
}

pub fn products() -> Value {
    json!({"products": [{"id": 1, "name": "Mug"}, {"id": 2, "name": "Tee"}], "total": 2})
}

/// Mock answering every read endpoint successfully.
pub fn healthy_upstream() -> MockHttpClient {
    upstream_except(&[])
}

/// Healthy upstream with the `skip` routes left unscripted, so a test can script them.
pub fn upstream_except(skip: &[&str]) -> MockHttpClient {
    let routes = [
        ("fetch-business-settings", business_info()),
        ("fetch-all-theme-settings", json!({"data": {"themes": ["classic"]}})),
        ("fetch-products", products()),
        ("fetch-categories", json!({"categories": [{"id": 3, "name": "Kitchen"}]})),
        ("fetch-brands", json!([{"id": 7, "name": "ACME"}])),
        ("fetch-featured-products", json!({"products": [{"id": 2, "name": "Tee"}]})),
        ("fetch-brand-names", json!({"brands": ["ACME", "Globex"]})),
    ];
    routes
        .into_iter()
        .filter(|(route, _)| !skip.contains(route))
        .fold(MockHttpClient::new(), |mock, (route, body)| mock.reply_json(route, body))
}

pub fn logged_in(brand_id: &str) -> Arc<MemorySession> {
    let session = MemorySession::new();
    session.set_cookie(BRAND_ID_COOKIE, brand_id);
    Arc::new(session)
}
