//! Write endpoints: save-settings and purge-cache. Never cached, critical retry policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::endpoints::Endpoint;
use super::SettingsClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::theme::WebTheme;

/// Which theme blob a save targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeType {
    Web,
    Mobile,
}

impl ThemeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for ThemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "mobile" => Ok(Self::Mobile),
            _ => Err(format!("unknown theme type: {} (use web or mobile)", s)),
        }
    }
}

impl SettingsClient {
    /// Persists `theme` as the brand's web or mobile theme. Returns the upstream payload.
    pub async fn save_settings(
        &self,
        brand_id: &str,
        user_id: &str,
        theme_type: ThemeType,
        theme: &WebTheme,
    ) -> Result<Value, ApiError> {
        let endpoint = Endpoint::SaveSettings;
        let payload = serde_json::to_string(&theme.to_value())?;
        let request = HttpRequest::post_form(
            self.url(endpoint)?,
            &[
                ("brand_id", brand_id),
                ("user_id", user_id),
                ("theme_type", theme_type.as_str()),
                ("settings", payload.as_str()),
            ],
        );
        let result = self
            .request_json(endpoint, request, None, self.critical_retry)
            .await?;
        info!(brand_id, theme_type = %theme_type, sections = theme.len(), "theme saved");
        Ok(result)
    }

    /// Asks upstream to invalidate its caches for `brand_id`.
    pub async fn purge_upstream(&self, brand_id: &str) -> Result<Value, ApiError> {
        let endpoint = Endpoint::PurgeCache;
        let request = HttpRequest::post_form(self.url(endpoint)?, &[("brand_id", brand_id)]);
        self.request_json(endpoint, request, None, self.critical_retry)
            .await
    }
}
