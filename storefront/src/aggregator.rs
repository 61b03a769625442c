//! Settings aggregation: one business-info fetch followed by the data sets the active
//! editor panel needs.
//!
//! Business info is mandatory and strictly precedes everything else; the per-panel fetches
//! run concurrently and a failing one never cancels its siblings.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::SettingsClient;
use crate::error::ApiError;
use crate::settings::{ActiveClass, BusinessInfo, ProductsPage, Settings};
use crate::theme::WebTheme;

/// Produces a fresh [`Settings`] for a brand.
///
/// **Interaction**: Implemented by [`SettingsClient`]; consumed by
/// [`SettingsStore`](crate::store::SettingsStore). Tests substitute scripted sources.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn fetch_all_settings(
        &self,
        brand_id: &str,
        active_class: Option<ActiveClass>,
    ) -> Result<Settings, ApiError>;
}

#[async_trait]
impl SettingsSource for SettingsClient {
    async fn fetch_all_settings(
        &self,
        brand_id: &str,
        active_class: Option<ActiveClass>,
    ) -> Result<Settings, ApiError> {
        let info = self.fetch_business_info(brand_id).await?;
        let mut settings = from_business_info(info);

        let Some(business_id) = settings.business_id().map(str::to_owned) else {
            debug!(brand_id, "business info has no business id, skipping dependent fetches");
            return Ok(settings);
        };

        settings.all_theme_settings = match self.fetch_all_theme_settings(&business_id).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(business_id = %business_id, error = %e, "aggregate theme settings unavailable");
                None
            }
        };

        match active_class {
            Some(ActiveClass::HomeSections) => {
                let (products, categories, brands, featured) = tokio::join!(
                    self.fetch_products(&business_id),
                    self.fetch_categories(&business_id),
                    self.fetch_brands(&business_id),
                    self.fetch_featured_products(&business_id),
                );
                settings.products = Some(products.unwrap_or_else(|e| {
                    warn!(business_id = %business_id, error = %e, "products unavailable, using empty page");
                    ProductsPage::default()
                }));
                settings.featured_categories = Some(categories);
                settings.featured_brands = Some(brands);
                settings.featured_products = Some(featured);
            }
            Some(ActiveClass::Banner) => {
                let (brands, categories, products) = tokio::join!(
                    self.fetch_brands(&business_id),
                    self.fetch_categories(&business_id),
                    self.fetch_products(&business_id),
                );
                settings.brands = Some(brands);
                settings.categories = Some(categories);
                settings.products = match products {
                    Ok(page) => Some(page),
                    Err(e) => {
                        warn!(business_id = %business_id, error = %e, "products unavailable");
                        None
                    }
                };
            }
            Some(ActiveClass::ThemeSettings) => {
                settings.brand_names = Some(self.fetch_brand_names().await);
            }
            None => {}
        }
        Ok(settings)
    }
}

/// Derives the theme fields of a new [`Settings`] from business info.
pub fn from_business_info(info: BusinessInfo) -> Settings {
    Settings {
        business_logo: info.business_logo.clone(),
        theme_settings: info.theme_settings.clone(),
        settings: parse_theme(info.web_theme.as_ref(), "web_theme"),
        mobile_settings: parse_theme(info.mobile_theme.as_ref(), "mobile_theme"),
        business_info: Some(info),
        ..Settings::default()
    }
}

fn parse_theme(blob: Option<&Value>, field: &'static str) -> Option<WebTheme> {
    let blob = blob.filter(|v| !v.is_null())?;
    match WebTheme::from_blob(blob) {
        Ok(theme) => Some(theme),
        Err(e) => {
            warn!(field, error = %e, "failed to parse theme blob");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpClient;
    use crate::retry::RetryPolicy;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    fn client(http: Arc<MockHttpClient>) -> SettingsClient {
        let no_retry = RetryPolicy::new(0, Duration::ZERO);
        SettingsClient::new(http, Url::parse("https://api.example.com/").unwrap())
            .with_retry_policies(no_retry, no_retry)
    }

    fn business() -> Value {
        json!({
            "business_id": 42,
            "business_logo": "logo.png",
            "web_theme": "{\"custom_css\":\"body{}\"}",
            "mobile_theme": "{not json",
            "theme_settings": {"primary": "#fff"}
        })
    }

    #[test]
    fn theme_fields_derive_from_business_info() {
        let info: BusinessInfo = serde_json::from_value(business()).unwrap();
        let s = from_business_info(info);
        assert_eq!(s.business_logo.as_deref(), Some("logo.png"));
        assert_eq!(s.theme_settings, Some(json!({"primary": "#fff"})));
        assert!(s.settings.is_some());
        assert!(s.mobile_settings.is_none());
    }

    #[tokio::test]
    async fn business_info_failure_fails_aggregation() {
        let http = Arc::new(MockHttpClient::new().reply("fetch-business-settings", 500, "down"));
        let err = client(http.clone())
            .fetch_all_settings("7", Some(ActiveClass::HomeSections))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
        assert_eq!(http.calls("fetch-products"), 0);
    }

    #[tokio::test]
    async fn missing_business_id_skips_branch_fetches() {
        let http = Arc::new(MockHttpClient::new().reply_json("fetch-business-settings", json!({"business_name": "ACME"})));
        let s = client(http.clone())
            .fetch_all_settings("7", Some(ActiveClass::Banner))
            .await
            .unwrap();
        assert!(s.business_info.is_some());
        assert!(s.brands.is_none());
        assert_eq!(http.calls("fetch-brands"), 0);
        assert_eq!(http.calls("fetch-all-theme-settings"), 0);
    }

    #[tokio::test]
    async fn banner_leaves_failed_products_unset() {
        let http = Arc::new(
            MockHttpClient::new()
                .reply_json("fetch-business-settings", business())
                .reply("fetch-all-theme-settings", 500, "down")
                .reply_json("fetch-brands", json!([{"id": 1}]))
                .reply_json("fetch-categories", json!([{"id": 2}]))
                .reply("fetch-products", 502, "bad gateway"),
        );
        let s = client(http).fetch_all_settings("7", Some(ActiveClass::Banner)).await.unwrap();
        assert_eq!(s.brands, Some(vec![json!({"id": 1})]));
        assert_eq!(s.categories, Some(vec![json!({"id": 2})]));
        assert!(s.products.is_none());
        assert!(s.all_theme_settings.is_none());
        assert!(s.featured_brands.is_none());
    }

    #[tokio::test]
    async fn theme_settings_fetches_brand_names_only() {
        let http = Arc::new(
            MockHttpClient::new()
                .reply_json("fetch-business-settings", business())
                .reply_json("fetch-all-theme-settings", json!({"themes": []}))
                .reply_json("fetch-brand-names", json!({"brands": ["ACME", "Globex"]})),
        );
        let s = client(http.clone())
            .fetch_all_settings("7", Some(ActiveClass::ThemeSettings))
            .await
            .unwrap();
        assert_eq!(s.brand_names, Some(vec![json!("ACME"), json!("Globex")]));
        assert_eq!(s.all_theme_settings, Some(json!({"themes": []})));
        assert_eq!(http.calls("fetch-products"), 0);
    }

    #[tokio::test]
    async fn no_active_class_fetches_nothing_extra() {
        let http = Arc::new(
            MockHttpClient::new()
                .reply_json("fetch-business-settings", business())
                .reply_json("fetch-all-theme-settings", json!({})),
        );
        let s = client(http.clone()).fetch_all_settings("7", None).await.unwrap();
        assert!(s.products.is_none() && s.brand_names.is_none());
        assert_eq!(http.requests().len(), 2);
    }
}
