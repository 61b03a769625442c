//! Editor views and navigation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The editor page currently shown. Gates refreshes and login redirects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    Header,
    #[default]
    Home,
    Footer,
    DetailPage,
    SearchCard,
    Css,
    Banner,
    ThemeSettings,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Header => "header",
            Self::Home => "home",
            Self::Footer => "footer",
            Self::DetailPage => "detail_page",
            Self::SearchCard => "search_card",
            Self::Css => "css",
            Self::Banner => "banner",
            Self::ThemeSettings => "theme_settings",
        }
    }

    /// Views that stay put when no brand is logged in.
    pub fn allows_anonymous(&self) -> bool {
        matches!(self, Self::Login | Self::Header | Self::Home)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        [
            Self::Login,
            Self::Header,
            Self::Home,
            Self::Footer,
            Self::DetailPage,
            Self::SearchCard,
            Self::Css,
            Self::Banner,
            Self::ThemeSettings,
        ]
        .into_iter()
        .find(|v| v.as_str() == normalized)
        .ok_or_else(|| format!("unknown view: {}", s))
    }
}

/// Performs view changes requested by the store (e.g. the login redirect).
pub trait Navigator: Send + Sync {
    fn redirect(&self, to: View);
}

/// Navigator for headless use; redirects are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect(&self, to: View) {
        debug!(view = %to, "redirect ignored");
    }
}
