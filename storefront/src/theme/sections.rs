//! Typed theme sections. Unknown keys inside a section are kept in `extra` so saving a
//! theme never drops fields this crate does not model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One list inside a header bar (e.g. a group of links or icons).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderList {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderBar {
    #[serde(default)]
    pub list: Vec<HeaderList>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Storefront header: navigation links and stacked bars.
///
/// Persisted locally as `headerConfig` so the editor can render offline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderConfig {
    #[serde(default)]
    pub nav: Vec<NavLink>,
    #[serde(default)]
    pub bars: Vec<HeaderBar>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FooterConfig {
    #[serde(default)]
    pub columns: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which catalog a home section's `ids` refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Products,
    Categories,
    Brands,
}

/// A home-page block (featured products, category strip, brand carousel, banner, ...).
///
/// `ids` are the merchant's picks; `items` is the denormalized copy rendered by the
/// storefront and recomputed on purge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeSection {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub ids: Vec<Value>,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HomeSection {
    /// Catalog backing this section, if its items come from one.
    pub fn source(&self) -> Option<CatalogSource> {
        match self.kind.as_str() {
            "featured_products" | "products" => Some(CatalogSource::Products),
            "featured_categories" | "categories" => Some(CatalogSource::Categories),
            "featured_brands" | "brands" => Some(CatalogSource::Brands),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeConfig {
    #[serde(default)]
    pub sections: Vec<HomeSection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailPageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Search-result card layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCardConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
