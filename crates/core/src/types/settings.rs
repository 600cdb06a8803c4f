//! Shop-wide appearance settings.
//!
//! Stored as a single document (`settings/general`). Reads are tolerant: every
//! missing or blank field falls back to its default independently. Writes are
//! merge-patches: only the keys present in a [`SettingsPatch`] are touched.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use super::product::empty_as_none;

/// Document id of the settings singleton.
pub const SETTINGS_DOCUMENT_ID: &str = "general";

pub const DEFAULT_SHOP_NAME: &str = "Elegant Collection";
pub const DEFAULT_LOGO_SIZE: u32 = 80;
pub const DEFAULT_BANNER_HEIGHT: u32 = 400;
pub const DEFAULT_CATEGORIES: [&str; 5] = ["General", "Electronics", "Fashion", "Home", "Art"];

/// Extracts the `src` attribute from a pasted `<iframe>` snippet.
static IFRAME_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src\s*=\s*["']([^"']+)["']"#).expect("Invalid regex"));

/// Color theme of the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dark => write!(f, "dark"),
            Self::Light => write!(f, "light"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            _ => Err(format!("invalid theme: {s}")),
        }
    }
}

/// How the logo is framed in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoShape {
    #[default]
    Rectangle,
    Square,
    Circle,
}

impl std::fmt::Display for LogoShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rectangle => write!(f, "rectangle"),
            Self::Square => write!(f, "square"),
            Self::Circle => write!(f, "circle"),
        }
    }
}

impl std::str::FromStr for LogoShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangle" => Ok(Self::Rectangle),
            "square" => Ok(Self::Square),
            "circle" => Ok(Self::Circle),
            _ => Err(format!("invalid logo shape: {s}")),
        }
    }
}

/// Resolved shop settings, every field defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSettings {
    pub shop_name: String,
    pub theme: Theme,
    pub logo_shape: LogoShape,
    pub logo_size: u32,
    pub banner_height: u32,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub slide_urls: Vec<String>,
    pub facebook_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub map_embed_url: Option<String>,
    pub categories: Vec<String>,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            shop_name: DEFAULT_SHOP_NAME.to_owned(),
            theme: Theme::default(),
            logo_shape: LogoShape::default(),
            logo_size: DEFAULT_LOGO_SIZE,
            banner_height: DEFAULT_BANNER_HEIGHT,
            logo_url: None,
            banner_url: None,
            slide_urls: Vec::new(),
            facebook_url: None,
            tiktok_url: None,
            map_embed_url: None,
            categories: DEFAULT_CATEGORIES.iter().map(|c| (*c).to_owned()).collect(),
        }
    }
}

/// Raw settings document as found in the store; any field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSettings {
    #[serde(deserialize_with = "empty_as_none")]
    shop_name: Option<String>,
    theme: Option<String>,
    logo_shape: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    logo_size: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    banner_height: Option<u32>,
    #[serde(deserialize_with = "empty_as_none")]
    logo_url: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    banner_url: Option<String>,
    slide_urls: Option<Vec<String>>,
    #[serde(deserialize_with = "empty_as_none")]
    facebook_url: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    tiktok_url: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    map_embed_url: Option<String>,
    categories: Option<Vec<String>>,
}

impl From<StoredSettings> for ShopSettings {
    fn from(stored: StoredSettings) -> Self {
        let defaults = Self::default();
        Self {
            shop_name: stored.shop_name.unwrap_or(defaults.shop_name),
            theme: stored
                .theme
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.theme),
            logo_shape: stored
                .logo_shape
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.logo_shape),
            logo_size: stored
                .logo_size
                .filter(|&n| n > 0)
                .unwrap_or(defaults.logo_size),
            banner_height: stored
                .banner_height
                .filter(|&n| n > 0)
                .unwrap_or(defaults.banner_height),
            logo_url: stored.logo_url,
            banner_url: stored.banner_url,
            slide_urls: stored
                .slide_urls
                .map(|urls| urls.into_iter().filter(|u| !u.is_empty()).collect())
                .unwrap_or_default(),
            facebook_url: stored.facebook_url,
            tiktok_url: stored.tiktok_url,
            map_embed_url: stored.map_embed_url,
            categories: stored.categories.unwrap_or(defaults.categories),
        }
    }
}

/// A merge-patch against the settings document.
///
/// `None` leaves the stored value untouched. URL fields use `Some("")` to clear,
/// matching how the stored documents represent "no image".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_shape: Option<LogoShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiktok_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_embed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl SettingsPatch {
    /// Whether the patch would write nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch to an in-memory copy, mirroring what the store does.
    pub fn apply_to(&self, settings: &mut ShopSettings) {
        fn url(value: &str) -> Option<String> {
            (!value.is_empty()).then(|| value.to_owned())
        }

        if let Some(v) = &self.shop_name {
            settings.shop_name.clone_from(v);
        }
        if let Some(v) = self.theme {
            settings.theme = v;
        }
        if let Some(v) = self.logo_shape {
            settings.logo_shape = v;
        }
        if let Some(v) = self.logo_size {
            settings.logo_size = v;
        }
        if let Some(v) = self.banner_height {
            settings.banner_height = v;
        }
        if let Some(v) = &self.logo_url {
            settings.logo_url = url(v);
        }
        if let Some(v) = &self.banner_url {
            settings.banner_url = url(v);
        }
        if let Some(v) = &self.slide_urls {
            settings.slide_urls.clone_from(v);
        }
        if let Some(v) = &self.facebook_url {
            settings.facebook_url = url(v);
        }
        if let Some(v) = &self.tiktok_url {
            settings.tiktok_url = url(v);
        }
        if let Some(v) = &self.map_embed_url {
            settings.map_embed_url = url(v);
        }
        if let Some(v) = &self.categories {
            settings.categories.clone_from(v);
        }
    }
}

/// Append a category if it is non-blank and not already present (case-sensitive).
///
/// Returns `None` when the list would not change.
#[must_use]
pub fn with_category_added(categories: &[String], name: &str) -> Option<Vec<String>> {
    let name = name.trim();
    if name.is_empty() || categories.iter().any(|c| c == name) {
        return None;
    }
    let mut updated = categories.to_vec();
    updated.push(name.to_owned());
    Some(updated)
}

/// Remove a category by exact name. Returns `None` when it was not listed.
#[must_use]
pub fn with_category_removed(categories: &[String], name: &str) -> Option<Vec<String>> {
    let updated: Vec<String> = categories.iter().filter(|c| *c != name).cloned().collect();
    (updated.len() != categories.len()).then_some(updated)
}

/// A pasted `<iframe>` snippet carried no `src` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("map embed iframe has no src attribute")]
pub struct MapEmbedError;

/// Normalize the map embed input: a bare URL, or the `src` of a pasted `<iframe>`.
///
/// Returns `Ok(None)` for blank input.
///
/// # Errors
///
/// Returns [`MapEmbedError`] for an iframe snippet without `src`.
pub fn normalize_map_embed(input: &str) -> Result<Option<String>, MapEmbedError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !trimmed.contains("<iframe") {
        return Ok(Some(trimmed.to_owned()));
    }
    IFRAME_SRC_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| Some(m.as_str().to_owned()))
        .ok_or(MapEmbedError)
}

/// Sizes were written by form inputs and may arrive as floats or strings.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Range-checked by try_from
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_document_fields_default_independently() {
        let stored: StoredSettings = serde_json::from_value(serde_json::json!({
            "shopName": "",
            "logoSize": 0,
            "bannerHeight": "520",
            "theme": "neon",
            "logoUrl": "https://a/upload/logo.png"
        }))
        .unwrap();
        let settings = ShopSettings::from(stored);
        assert_eq!(settings.shop_name, DEFAULT_SHOP_NAME);
        assert_eq!(settings.logo_size, DEFAULT_LOGO_SIZE);
        assert_eq!(settings.banner_height, 520);
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.logo_url.as_deref(), Some("https://a/upload/logo.png"));
        assert_eq!(settings.categories.len(), 5);
    }

    #[test]
    fn test_patch_serializes_only_present_keys() {
        let patch = SettingsPatch {
            banner_height: Some(500),
            ..SettingsPatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "bannerHeight": 500 })
        );
        assert!(!patch.is_empty());
        assert!(SettingsPatch::default().is_empty());
    }

    #[test]
    fn test_patch_apply_clears_urls_with_empty_string() {
        let mut settings = ShopSettings {
            logo_url: Some("x".into()),
            ..ShopSettings::default()
        };
        SettingsPatch {
            logo_url: Some(String::new()),
            theme: Some(Theme::Light),
            ..SettingsPatch::default()
        }
        .apply_to(&mut settings);
        assert_eq!(settings.logo_url, None);
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.shop_name, DEFAULT_SHOP_NAME);
    }

    #[test]
    fn test_category_added() {
        let list = vec!["General".to_string()];
        assert_eq!(with_category_added(&list, ""), None);
        assert_eq!(with_category_added(&list, "   "), None);
        assert_eq!(with_category_added(&list, "General"), None);
        assert_eq!(
            with_category_added(&list, " general "),
            Some(vec!["General".to_string(), "general".to_string()])
        );
    }

    #[test]
    fn test_category_removed() {
        let list = vec!["General".to_string(), "Art".to_string()];
        assert_eq!(
            with_category_removed(&list, "Art"),
            Some(vec!["General".to_string()])
        );
        assert_eq!(with_category_removed(&list, "art"), None);
    }

    #[test]
    fn test_map_embed_normalization() {
        assert_eq!(normalize_map_embed("  "), Ok(None));
        assert_eq!(
            normalize_map_embed("https://maps.example.com/embed?pb=1"),
            Ok(Some("https://maps.example.com/embed?pb=1".to_string()))
        );
        assert_eq!(
            normalize_map_embed(
                r#"<iframe src="https://maps.example.com/embed?pb=2" width="600"></iframe>"#
            ),
            Ok(Some("https://maps.example.com/embed?pb=2".to_string()))
        );
        assert_eq!(
            normalize_map_embed("<iframe width=600></iframe>"),
            Err(MapEmbedError)
        );
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("circle".parse::<LogoShape>().unwrap(), LogoShape::Circle);
        assert!("oval".parse::<LogoShape>().is_err());
        assert_eq!(Theme::Light.to_string(), "light");
    }
}
