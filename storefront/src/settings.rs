//! Settings view model assembled from the upstream endpoints.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::theme::WebTheme;

/// Selects which extra data sets a refresh fetches alongside business info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveClass {
    /// Home dashboard: products, categories, brands and featured products.
    HomeSections,
    /// Banner editor: brands, categories and products.
    Banner,
    /// Theme settings editor: brand names.
    ThemeSettings,
}

impl ActiveClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HomeSections => "home_sections",
            Self::Banner => "banner",
            Self::ThemeSettings => "theme_settings",
        }
    }
}

impl fmt::Display for ActiveClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActiveClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home_sections" => Ok(Self::HomeSections),
            "banner" => Ok(Self::Banner),
            "theme_settings" => Ok(Self::ThemeSettings),
            _ => Err(format!(
                "unknown active class: {} (use home_sections, banner, or theme_settings)",
                s
            )),
        }
    }
}

/// Accepts a numeric or string identifier; empty strings read as absent.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Brand identity plus the raw theme blobs, as returned by fetch-business-settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessInfo {
    #[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_logo: Option<String>,
    /// Web theme as JSON text or object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_theme: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_theme: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_settings: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Product listing page: `{ "products": [...], ...paging fields }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductsPage {
    #[serde(default)]
    pub products: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of the last refresh, rendered as an inline banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Unified client-side view of a brand's storefront configuration.
///
/// `business_info` is authoritative: `settings` and `mobile_settings` are parsed from its
/// `web_theme` / `mobile_theme` fields. Collections stay `None` until fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub business_info: Option<BusinessInfo>,
    pub settings: Option<WebTheme>,
    pub mobile_settings: Option<WebTheme>,
    pub theme_settings: Option<Value>,
    pub all_theme_settings: Option<Value>,
    pub products: Option<ProductsPage>,
    pub categories: Option<Vec<Value>>,
    pub featured_categories: Option<Vec<Value>>,
    pub brands: Option<Vec<Value>>,
    pub featured_brands: Option<Vec<Value>>,
    pub featured_products: Option<Vec<Value>>,
    pub brand_names: Option<Vec<Value>>,
    pub business_logo: Option<String>,
    #[serde(rename = "isLoading")]
    pub is_loading: bool,
    pub error: Option<String>,
    #[serde(rename = "apiStatus")]
    pub api_status: Option<ApiStatus>,
    #[serde(rename = "lastRefreshed")]
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl Settings {
    /// Business id from business info, if any.
    pub fn business_id(&self) -> Option<&str> {
        self.business_info.as_ref()?.business_id.as_deref()
    }

    /// Merges fetched data into `self`. Theme-derived fields always follow the new
    /// business info; collections are only replaced when the fetch returned them.
    pub fn merge_fetched(&mut self, fetched: Settings) {
        self.business_info = fetched.business_info;
        self.settings = fetched.settings;
        self.mobile_settings = fetched.mobile_settings;
        self.theme_settings = fetched.theme_settings;
        self.business_logo = fetched.business_logo;

        macro_rules! take_some {
            ($($field:ident),* $(,)?) => {
                $(if fetched.$field.is_some() {
                    self.$field = fetched.$field;
                })*
            };
        }
        take_some!(
            all_theme_settings,
            products,
            categories,
            featured_categories,
            brands,
            featured_brands,
            featured_products,
            brand_names,
        );
    }

    /// Fills collections that were never populated with their empty shape.
    pub fn fill_empty_collections(&mut self) {
        self.products.get_or_insert_with(ProductsPage::default);
        for field in [
            &mut self.categories,
            &mut self.featured_categories,
            &mut self.brands,
            &mut self.featured_brands,
            &mut self.featured_products,
            &mut self.brand_names,
        ] {
            field.get_or_insert_with(Vec::new);
        }
    }

    /// Drops everything scoped to a brand (used when no brand is logged in).
    pub fn clear_brand_data(&mut self) {
        let keep_loading = self.is_loading;
        *self = Settings {
            is_loading: keep_loading,
            ..Settings::default()
        };
    }
}
