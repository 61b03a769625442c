//! Cache, limiter and retry working together inside `SettingsClient`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::json;
use storefront::{ApiError, MockHttpClient, DEFAULT_CACHE_TTL};

#[tokio::test(start_paused = true)]
async fn cached_business_info_skips_network_until_ttl_expires() {
    let http = Arc::new(MockHttpClient::new().reply_json("fetch-business-settings", common::business_info()));
    let client = common::client(http.clone());

    client.fetch_business_info("7").await.unwrap();
    tokio::time::advance(DEFAULT_CACHE_TTL - Duration::from_millis(1)).await;
    client.fetch_business_info("7").await.unwrap();
    assert_eq!(http.calls("fetch-business-settings"), 1);

    tokio::time::advance(Duration::from_millis(1)).await;
    client.fetch_business_info("7").await.unwrap();
    assert_eq!(http.calls("fetch-business-settings"), 2);
}

#[tokio::test(start_paused = true)]
async fn cache_is_keyed_per_resource_and_id() {
    let http = Arc::new(common::healthy_upstream());
    let client = common::client(http.clone());

    client.fetch_products("42").await.unwrap();
    client.fetch_products("43").await.unwrap();
    client.fetch_products("42").await.unwrap();
    client.fetch_categories("42").await;

    assert_eq!(http.calls("fetch-products"), 2);
    assert_eq!(http.calls("fetch-categories"), 1);
    assert_eq!(client.cache().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn at_most_three_requests_reach_upstream_at_once() {
    let http = Arc::new(
        MockHttpClient::new()
            .reply_json("fetch-products", json!([]))
            .delay("fetch-products", Duration::from_millis(100)),
    );
    let client = common::client(http.clone());
    let start = tokio::time::Instant::now();

    let ids: Vec<String> = (0..8).map(|i| format!("b{}", i)).collect();
    let results = join_all(ids.iter().map(|id| client.fetch_products(id))).await;
    assert!(results.iter().all(|r| r.is_ok()));

    // Which 100ms wave each request started in.
    let waves: Vec<u128> = http
        .call_times("fetch-products")
        .into_iter()
        .map(|t| t.duration_since(start).as_millis() / 100)
        .collect();
    assert_eq!(waves, vec![0, 0, 0, 1, 1, 1, 2, 2]);

    // Arrival order matches submission order.
    let arrived: Vec<String> = http
        .requests()
        .iter()
        .filter_map(|r| r.form_value("business_id").map(str::to_owned))
        .collect();
    assert_eq!(arrived, ids);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_is_retried_then_served_and_cached() {
    let http = Arc::new(
        MockHttpClient::new()
            .reply("fetch-business-settings", 429, "Too Many Requests")
            .reply_json("fetch-business-settings", common::business_info()),
    );
    let client = common::client(http.clone());

    let info = client.fetch_business_info("7").await.unwrap();
    assert_eq!(info.business_id.as_deref(), Some("42"));
    assert_eq!(http.calls("fetch-business-settings"), 2);

    client.fetch_business_info("7").await.unwrap();
    assert_eq!(http.calls("fetch-business-settings"), 2);
}

#[tokio::test(start_paused = true)]
async fn persistent_rate_limit_surfaces_as_rate_limited() {
    let http = Arc::new(MockHttpClient::new().reply("fetch-business-settings", 429, "Too Many Requests"));
    let client = common::client(http.clone());

    let err = client.fetch_business_info("7").await.unwrap_err();
    assert_eq!(err, ApiError::RateLimited);
    assert_eq!(http.calls("fetch-business-settings"), 2);
    assert!(client.cache().is_empty());
    assert_eq!(client.limiter().in_flight(), 0);
}
