//! Cache purge: invalidate upstream and local caches, then rebuild the denormalized home
//! section items from fresh catalog data and save the web theme.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{SettingsClient, ThemeType};
use crate::error::ApiError;
use crate::theme::{CatalogSource, HomeConfig, WebTheme};

/// What a purge did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub business_id: String,
    /// Home sections whose `items` were rebuilt.
    pub sections_recomputed: usize,
    /// Sections left alone because their catalog came back empty.
    pub sections_skipped: usize,
    /// False when the brand has no web theme to save.
    pub saved: bool,
}

/// Catalog data the home sections are rebuilt from.
#[derive(Debug, Default)]
pub struct Catalog {
    pub products: Vec<Value>,
    pub categories: Vec<Value>,
    pub brands: Vec<Value>,
}

impl Catalog {
    fn items(&self, source: CatalogSource) -> &[Value] {
        match source {
            CatalogSource::Products => &self.products,
            CatalogSource::Categories => &self.categories,
            CatalogSource::Brands => &self.brands,
        }
    }
}

/// Purges caches for `brand_id` and re-saves its web theme with fresh section items.
pub async fn purge_cache(
    client: &SettingsClient,
    brand_id: &str,
    user_id: &str,
) -> Result<PurgeReport, ApiError> {
    client.purge_upstream(brand_id).await?;
    client.cache().clear();
    info!(brand_id, "upstream and local caches purged");

    let info = client.fetch_business_info(brand_id).await?;
    let business_id = info.business_id.clone().ok_or(ApiError::MissingBusinessId)?;

    let (products, categories, brands) = tokio::join!(
        client.fetch_products(&business_id),
        client.fetch_categories(&business_id),
        client.fetch_brands(&business_id),
    );
    let catalog = Catalog {
        products: products?.products,
        categories,
        brands,
    };

    let mut report = PurgeReport {
        business_id,
        ..PurgeReport::default()
    };
    let Some(blob) = info.web_theme.as_ref().filter(|v| !v.is_null()) else {
        info!(brand_id, "no web theme to rebuild");
        return Ok(report);
    };
    let mut theme = WebTheme::from_blob(blob).map_err(|e| ApiError::Parse(e.to_string()))?;

    if let Some(home) = theme.home_mut() {
        let (recomputed, skipped) = recompute_home(home, &catalog);
        report.sections_recomputed = recomputed;
        report.sections_skipped = skipped;
    }

    client
        .save_settings(brand_id, user_id, ThemeType::Web, &theme)
        .await?;
    report.saved = true;
    info!(
        brand_id,
        recomputed = report.sections_recomputed,
        skipped = report.sections_skipped,
        "home sections rebuilt and saved"
    );
    Ok(report)
}

/// Rebuilds each catalog-backed section's `items` from its `ids`, in `ids` order.
/// Unknown ids are dropped. Returns (recomputed, skipped).
pub fn recompute_home(home: &mut HomeConfig, catalog: &Catalog) -> (usize, usize) {
    let mut recomputed = 0;
    let mut skipped = 0;
    for section in home.sections.iter_mut() {
        let Some(source) = section.source() else {
            continue;
        };
        let items = catalog.items(source);
        if items.is_empty() {
            warn!(section = %section.kind, "catalog empty, keeping section items");
            skipped += 1;
            continue;
        }
        let by_id: HashMap<String, &Value> = items
            .iter()
            .filter_map(|item| Some((id_key(item.get("id")?)?, item)))
            .collect();
        section.items = section
            .ids
            .iter()
            .filter_map(|id| by_id.get(&id_key(id)?).map(|v| (*v).clone()))
            .collect();
        recomputed += 1;
    }
    (recomputed, skipped)
}

/// Ids arrive as numbers or strings; compare them as text.
fn id_key(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
