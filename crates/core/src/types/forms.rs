//! Submitted edit forms for the settings editor.
//!
//! Scalar fields are `Option`: `None` means "not part of this submit" and
//! leaves the stored value alone.

use super::asset::{MultiAssetField, SingleAssetField};
use super::settings::{LogoShape, Theme};

/// Appearance tab: branding images and layout knobs.
///
/// `logo`/`banner` are `None` when the submit does not touch the image;
/// `Some(SingleAssetField::Empty)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppearanceForm {
    pub shop_name: Option<String>,
    pub theme: Option<Theme>,
    pub logo_shape: Option<LogoShape>,
    pub logo_size: Option<u32>,
    pub banner_height: Option<u32>,
    pub logo: Option<SingleAssetField>,
    pub banner: Option<SingleAssetField>,
}

/// Social tab: outbound links and the map embed.
///
/// `Some("")` clears a link.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialForm {
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub tiktok_url: Option<String>,
    #[serde(default)]
    pub map_embed_url: Option<String>,
}

/// Activities tab: the promotional slide gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlidesForm {
    pub slides: MultiAssetField,
}
