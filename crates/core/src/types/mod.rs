//! Domain types for Vitrine.

pub mod asset;
pub mod forms;
pub mod id;
pub mod product;
pub mod settings;

pub use asset::{Asset, ImageUpload, MultiAssetField, SingleAssetField};
pub use forms::{AppearanceForm, SlidesForm, SocialForm};
pub use id::*;
pub use product::{DEFAULT_CATEGORY, Product, ProductDraft};
pub use settings::{
    LogoShape, MapEmbedError, SETTINGS_DOCUMENT_ID, SettingsPatch, ShopSettings, StoredSettings,
    Theme, normalize_map_embed, with_category_added, with_category_removed,
};
