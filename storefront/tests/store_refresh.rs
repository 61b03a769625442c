//! Settings store driven by the real client against a scripted upstream.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use storefront::session::HEADER_CONFIG_ITEM;
use storefront::{
    ActiveClass, MemorySession, MockHttpClient, NoopNavigator, ProductsPage, RefreshOutcome,
    Session, SettingsStore, SkipReason, View,
};

fn store(http: Arc<MockHttpClient>, session: Arc<MemorySession>) -> SettingsStore {
    SettingsStore::new(Arc::new(common::client(http)), session, Arc::new(NoopNavigator))
}

#[tokio::test(start_paused = true)]
async fn home_sections_survive_failing_categories_and_brands() {
    let http = Arc::new(
        common::upstream_except(&["fetch-categories", "fetch-brands"])
            .reply("fetch-categories", 500, "internal error")
            .fail("fetch-brands", "connection reset"),
    );
    let store = store(http, common::logged_in("7"));
    store.set_active_class(Some(ActiveClass::HomeSections));

    assert_eq!(store.refresh_settings().await, RefreshOutcome::Applied);
    let s = store.settings();
    assert_eq!(s.featured_categories, Some(vec![]));
    assert_eq!(s.featured_brands, Some(vec![]));
    assert_eq!(s.products.as_ref().map(|p| p.products.len()), Some(2));
    assert_eq!(s.featured_products, Some(vec![json!({"id": 2, "name": "Tee"})]));
    assert_eq!(s.all_theme_settings, Some(json!({"themes": ["classic"]})));
    assert!(s.error.is_none());
    assert_eq!(s.business_logo.as_deref(), Some("https://cdn.example.com/logo.png"));
}

#[tokio::test(start_paused = true)]
async fn home_sections_products_failure_yields_empty_page() {
    let http = Arc::new(
        common::upstream_except(&["fetch-products"]).reply("fetch-products", 503, "unavailable"),
    );
    let store = store(http, common::logged_in("7"));
    store.set_active_class(Some(ActiveClass::HomeSections));

    assert_eq!(store.refresh_settings().await, RefreshOutcome::Applied);
    assert_eq!(store.settings().products, Some(ProductsPage::default()));
}

#[tokio::test(start_paused = true)]
async fn no_brand_anywhere_reports_not_logged_in() {
    let http = Arc::new(common::healthy_upstream());
    let store = store(http.clone(), Arc::new(MemorySession::new()));
    store.set_view(View::Footer);

    assert_eq!(store.refresh_settings().await, RefreshOutcome::NotLoggedIn);
    let s = store.settings();
    assert_eq!(s.error.as_deref(), Some("Not logged in"));
    assert!(s.products.is_none());
    assert_eq!(store.view(), View::Login);
    assert!(http.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn two_refreshes_within_interval_dispatch_once() {
    let http = Arc::new(common::healthy_upstream());
    let store = store(http.clone(), common::logged_in("7"));

    assert_eq!(store.refresh_settings().await, RefreshOutcome::Applied);
    tokio::time::advance(Duration::from_millis(1000)).await;
    assert_eq!(
        store.refresh_settings().await,
        RefreshOutcome::Skipped(SkipReason::Debounced)
    );
    assert_eq!(http.calls("fetch-business-settings"), 1);
}

#[tokio::test(start_paused = true)]
async fn keyed_header_maps_become_ordered_arrays_and_are_persisted() {
    let http = Arc::new(common::healthy_upstream());
    let session = common::logged_in("7");
    let store = store(http, session.clone());

    assert_eq!(store.refresh_settings().await, RefreshOutcome::Applied);
    let s = store.settings();
    let header = s.settings.as_ref().and_then(|t| t.header()).unwrap();
    let labels: Vec<&str> = header.nav.iter().filter_map(|n| n.label.as_deref()).collect();
    assert_eq!(labels, vec!["Shop", "About", "Contact"]);
    assert_eq!(header.bars[0].list[0].items, vec![json!({"icon": "cart"})]);

    let stored: Value = serde_json::from_str(&session.local_item(HEADER_CONFIG_ITEM).unwrap()).unwrap();
    assert_eq!(stored["nav"][2]["url"], json!("/contact"));
    assert!(stored["bars"][0]["list"].is_array());
}

#[tokio::test(start_paused = true)]
async fn untyped_header_is_still_normalized_and_persisted() {
    let http = Arc::new(
        common::upstream_except(&["fetch-business-settings"]).reply_json(
            "fetch-business-settings",
            json!({
                "business_id": 42,
                "web_theme": {
                    "header": {
                        "nav": {"a": {"label": 1}, "b": {"label": "B"}},
                        "bars": {"top": {"list": {"x": "plain", "y": {"items": {"k": 3}}}}}
                    }
                }
            }),
        ),
    );
    let session = common::logged_in("7");
    let store = store(http, session.clone());

    assert_eq!(store.refresh_settings().await, RefreshOutcome::Applied);
    let expected = json!({
        "nav": [{"label": 1}, {"label": "B"}],
        "bars": [{"list": ["plain", {"items": [3]}]}]
    });
    let s = store.settings();
    assert_eq!(s.settings.as_ref().and_then(|t| t.header_value()), Some(expected.clone()));

    let stored: Value = serde_json::from_str(&session.local_item(HEADER_CONFIG_ITEM).unwrap()).unwrap();
    assert_eq!(stored, expected);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_previous_data_and_falls_back_to_stored_header() {
    let http = Arc::new(
        common::upstream_except(&["fetch-business-settings"])
            .reply("fetch-business-settings", 500, "down"),
    );
    let session = common::logged_in("7");
    session.set_local_item(HEADER_CONFIG_ITEM, r#"{"nav":[{"label":"Cached"}]}"#);
    let store = store(http, session);

    let outcome = store.refresh_settings().await;
    assert!(matches!(outcome, RefreshOutcome::Failed(_)));
    let s = store.settings();
    assert_eq!(s.api_status.as_ref().map(|a| a.success), Some(false));
    assert_eq!(s.brand_names, Some(vec![]));
    let header = s.settings.as_ref().and_then(|t| t.header()).unwrap();
    assert_eq!(header.nav[0].label.as_deref(), Some("Cached"));
}

#[tokio::test(start_paused = true)]
async fn switching_panels_mid_refresh_drops_the_old_result() {
    let http = Arc::new(
        common::healthy_upstream().delay("fetch-business-settings", Duration::from_millis(200)),
    );
    let store = store(http, common::logged_in("7"));
    store.set_active_class(Some(ActiveClass::ThemeSettings));

    let refresh = store.refresh_settings();
    let switch = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.set_active_class(Some(ActiveClass::Banner));
    };
    let (outcome, ()) = tokio::join!(refresh, switch);

    assert_eq!(outcome, RefreshOutcome::Stale);
    let s = store.settings();
    assert!(s.brand_names.is_none());
    assert!(s.business_info.is_none());
    assert!(!s.is_loading);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_loading_then_result() {
    let http = Arc::new(
        common::healthy_upstream().delay("fetch-business-settings", Duration::from_millis(100)),
    );
    let store = store(http, common::logged_in("7"));
    let mut rx = store.subscribe();

    let refresh = store.refresh_settings();
    let observe = async {
        rx.changed().await.unwrap();
        let loading = rx.borrow_and_update().is_loading;
        rx.changed().await.unwrap();
        let done = rx.borrow_and_update().clone();
        (loading, done)
    };
    let (outcome, (loading, done)) = tokio::join!(refresh, observe);

    assert_eq!(outcome, RefreshOutcome::Applied);
    assert!(loading);
    assert!(!done.is_loading);
    assert!(done.last_refreshed.is_some());
}
