//! Upstream endpoints, relative to the configured API base URL.

/// One upstream operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    BusinessSettings,
    AllThemeSettings,
    Products,
    Categories,
    Brands,
    FeaturedProducts,
    BrandNames,
    SaveSettings,
    PurgeCache,
}

impl Endpoint {
    /// Path segment joined onto the base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::BusinessSettings => "fetch-business-settings",
            Self::AllThemeSettings => "fetch-all-theme-settings",
            Self::Products => "fetch-products",
            Self::Categories => "fetch-categories",
            Self::Brands => "fetch-brands",
            Self::FeaturedProducts => "fetch-featured-products",
            Self::BrandNames => "fetch-brand-names",
            Self::SaveSettings => "save-settings",
            Self::PurgeCache => "purge-cache",
        }
    }

    /// Resource name used as the response-cache key prefix. Writes are never cached.
    pub fn cache_resource(&self) -> Option<&'static str> {
        match self {
            Self::BusinessSettings => Some("business_info"),
            Self::AllThemeSettings => Some("all_theme_settings"),
            Self::Products => Some("products"),
            Self::Categories => Some("categories"),
            Self::Brands => Some("brands"),
            Self::FeaturedProducts => Some("featured_products"),
            Self::BrandNames => Some("brand_names"),
            Self::SaveSettings | Self::PurgeCache => None,
        }
    }
}
