//! Web theme model: the JSON blob holding a storefront's header, footer, home sections,
//! CSS, detail-page template and search-card layout.
//!
//! Upstream stores the theme as a loosely-typed object (sometimes as a JSON string of it).
//! [`WebTheme`] validates it at the parse boundary into one [`ThemeSection`] per key;
//! sections that are unknown, or whose value does not fit the known shape, are kept
//! verbatim as [`ThemeSection::Raw`] (a raw header still gets its lists normalized).
//! Typed sections keep unknown fields; an explicit `null` on an optional typed field is
//! written back as an absent key.

mod normalize;
mod sections;

pub use normalize::{coerce_sequence, normalize_header};
pub use sections::{
    CatalogSource, DetailPageConfig, FooterConfig, HeaderBar, HeaderConfig, HeaderList,
    HomeConfig, HomeSection, NavLink, SearchCardConfig,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const HEADER_KEY: &str = "header";
pub const FOOTER_KEY: &str = "footer";
pub const HOME_KEY: &str = "home";
pub const DETAIL_PAGE_KEY: &str = "detail_page";
pub const SEARCH_CARD_KEY: &str = "search_card";
pub const CSS_KEY: &str = "custom_css";

/// One top-level theme section.
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeSection {
    Header(HeaderConfig),
    Footer(FooterConfig),
    Home(HomeConfig),
    DetailPage(DetailPageConfig),
    SearchCard(SearchCardConfig),
    Css(String),
    /// Unknown key, or a known key whose value did not validate.
    Raw(Value),
}

impl ThemeSection {
    /// Validates `value` as the section named `key`, falling back to [`ThemeSection::Raw`].
    ///
    /// A header is normalized before validation, so a raw header keeps the coerced lists.
    pub fn parse(key: &str, mut value: Value) -> Self {
        let typed = match key {
            HEADER_KEY => {
                normalize_header(&mut value);
                serde_json::from_value(value.clone()).map(Self::Header)
            }
            FOOTER_KEY => serde_json::from_value(value.clone()).map(Self::Footer),
            HOME_KEY => serde_json::from_value(value.clone()).map(Self::Home),
            DETAIL_PAGE_KEY => serde_json::from_value(value.clone()).map(Self::DetailPage),
            SEARCH_CARD_KEY => serde_json::from_value(value.clone()).map(Self::SearchCard),
            CSS_KEY => {
                return match value {
                    Value::String(css) => Self::Css(css),
                    other => Self::Raw(other),
                }
            }
            _ => return Self::Raw(value),
        };
        typed.unwrap_or_else(|e| {
            warn!(section = key, error = %e, "theme section does not match its shape, keeping raw");
            Self::Raw(value)
        })
    }

    pub fn to_value(&self) -> Value {
        let typed = match self {
            Self::Header(h) => serde_json::to_value(h),
            Self::Footer(f) => serde_json::to_value(f),
            Self::Home(h) => serde_json::to_value(h),
            Self::DetailPage(d) => serde_json::to_value(d),
            Self::SearchCard(s) => serde_json::to_value(s),
            Self::Css(css) => return Value::String(css.clone()),
            Self::Raw(v) => return v.clone(),
        };
        // Derived Serialize over String/Vec/Map fields cannot fail.
        typed.unwrap_or(Value::Null)
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// Error for a theme blob that is not a JSON object (or a string containing one).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid web theme: {0}")]
pub struct ThemeError(pub String);

/// Parsed web theme, section order preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct WebTheme {
    sections: IndexMap<String, ThemeSection>,
}

impl WebTheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a theme object section by section.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let sections = map
            .into_iter()
            .map(|(key, value)| {
                let section = ThemeSection::parse(&key, value);
                (key, section)
            })
            .collect();
        Self { sections }
    }

    /// Accepts either an object or a string holding JSON text of an object.
    pub fn from_blob(blob: &Value) -> Result<Self, ThemeError> {
        match blob {
            Value::Object(map) => Ok(Self::from_map(map.clone())),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => Ok(Self::from_map(map)),
                Ok(other) => Err(ThemeError(format!("expected object, got {}", kind_of(&other)))),
                Err(e) => Err(ThemeError(e.to_string())),
            },
            other => Err(ThemeError(format!("expected object or string, got {}", kind_of(other)))),
        }
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .sections
            .iter()
            .map(|(k, s)| (k.clone(), s.to_value()))
            .collect();
        Value::Object(map)
    }

    pub fn section(&self, key: &str) -> Option<&ThemeSection> {
        self.sections.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, section: ThemeSection) {
        self.sections.insert(key.into(), section);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn header(&self) -> Option<&HeaderConfig> {
        match self.sections.get(HEADER_KEY)? {
            ThemeSection::Header(h) => Some(h),
            _ => None,
        }
    }

    /// Header as JSON, typed or raw.
    pub fn header_value(&self) -> Option<Value> {
        self.section(HEADER_KEY).map(ThemeSection::to_value)
    }

    pub fn set_header(&mut self, header: HeaderConfig) {
        self.insert(HEADER_KEY, ThemeSection::Header(header));
    }

    pub fn home(&self) -> Option<&HomeConfig> {
        match self.sections.get(HOME_KEY)? {
            ThemeSection::Home(h) => Some(h),
            _ => None,
        }
    }

    pub fn home_mut(&mut self) -> Option<&mut HomeConfig> {
        match self.sections.get_mut(HOME_KEY)? {
            ThemeSection::Home(h) => Some(h),
            _ => None,
        }
    }

    /// Re-validates raw sections under known keys, normalizing the header even when it
    /// stays raw. Returns how many sections became typed.
    pub fn normalize(&mut self) -> usize {
        let mut promoted = 0;
        for (key, section) in self.sections.iter_mut() {
            if let ThemeSection::Raw(value) = section {
                let reparsed = ThemeSection::parse(key, std::mem::take(value));
                if !reparsed.is_raw() {
                    promoted += 1;
                }
                *section = reparsed;
            }
        }
        promoted
    }
}

impl TryFrom<Value> for WebTheme {
    type Error = ThemeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_blob(&value)
    }
}

impl From<WebTheme> for Value {
    fn from(theme: WebTheme) -> Self {
        theme.to_value()
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
