//! Read endpoints. Business info, products and aggregate theme settings propagate their
//! errors; categories, brands, featured products and brand names are non-critical and
//! degrade to an empty list.

use serde_json::Value;
use tracing::warn;

use super::endpoints::Endpoint;
use super::payload::{as_list, decode};
use super::SettingsClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::settings::{BusinessInfo, ProductsPage};

/// Cache scope for endpoints that take no identifier.
const GLOBAL_SCOPE: &str = "all";

impl SettingsClient {
    /// Brand identity and theme blobs. Failure here fails the whole aggregation.
    pub async fn fetch_business_info(&self, brand_id: &str) -> Result<BusinessInfo, ApiError> {
        let endpoint = Endpoint::BusinessSettings;
        let request = HttpRequest::post_form(self.url(endpoint)?, &[("brand_id", brand_id)]);
        let value = self
            .request_json(endpoint, request, Some(brand_id), self.critical_retry)
            .await?;
        decode(value)
    }

    /// Aggregate theme settings for a business.
    pub async fn fetch_all_theme_settings(&self, business_id: &str) -> Result<Value, ApiError> {
        let endpoint = Endpoint::AllThemeSettings;
        let request = HttpRequest::post_form(self.url(endpoint)?, &[("business_id", business_id)]);
        self.request_json(endpoint, request, Some(business_id), self.light_retry)
            .await
    }

    pub async fn fetch_products(&self, business_id: &str) -> Result<ProductsPage, ApiError> {
        let endpoint = Endpoint::Products;
        let request = HttpRequest::post_form(self.url(endpoint)?, &[("business_id", business_id)]);
        let value = self
            .request_json(endpoint, request, Some(business_id), self.light_retry)
            .await?;
        match value {
            Value::Array(products) => Ok(ProductsPage {
                products,
                ..ProductsPage::default()
            }),
            other => decode(other),
        }
    }

    pub async fn fetch_categories(&self, business_id: &str) -> Vec<Value> {
        let result = self
            .fetch_list_get(Endpoint::Categories, business_id, "categories")
            .await;
        non_critical(Endpoint::Categories, result)
    }

    pub async fn fetch_brands(&self, business_id: &str) -> Vec<Value> {
        let result = self
            .fetch_list_get(Endpoint::Brands, business_id, "brands")
            .await;
        non_critical(Endpoint::Brands, result)
    }

    pub async fn fetch_featured_products(&self, business_id: &str) -> Vec<Value> {
        let result = self
            .fetch_list_get(Endpoint::FeaturedProducts, business_id, "products")
            .await;
        non_critical(Endpoint::FeaturedProducts, result)
    }

    /// Every brand name known upstream (POST with an empty body).
    pub async fn fetch_brand_names(&self) -> Vec<Value> {
        let endpoint = Endpoint::BrandNames;
        let result = async {
            let request = HttpRequest::post_form(self.url(endpoint)?, &[]);
            let value = self
                .request_json(endpoint, request, Some(GLOBAL_SCOPE), self.light_retry)
                .await?;
            as_list(value, "brands")
        }
        .await;
        non_critical(endpoint, result)
    }

    async fn fetch_list_get(
        &self,
        endpoint: Endpoint,
        business_id: &str,
        list_key: &str,
    ) -> Result<Vec<Value>, ApiError> {
        let request = HttpRequest::get(self.url(endpoint)?, &[("business_id", business_id)]);
        let value = self
            .request_json(endpoint, request, Some(business_id), self.light_retry)
            .await?;
        as_list(value, list_key)
    }
}

fn non_critical(endpoint: Endpoint, result: Result<Vec<Value>, ApiError>) -> Vec<Value> {
    result.unwrap_or_else(|e| {
        warn!(endpoint = endpoint.path(), error = %e, "non-critical fetch failed, using empty list");
        Vec::new()
    })
}
