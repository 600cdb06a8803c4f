//! Media host access.
//!
//! [`AssetStore`] is the seam between the editors and the CDN holding image
//! binaries. [`CloudinaryClient`] talks to the real host; `FakeAssetStore`
//! (tests and the `testing` feature) records calls instead.

pub mod cloudinary;
#[cfg(any(test, feature = "testing"))]
pub mod fake;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use vitrine_core::asset_id;
use vitrine_core::{Asset, ImageUpload};

pub use cloudinary::CloudinaryClient;
#[cfg(any(test, feature = "testing"))]
pub use fake::{FakeAssetStore, MediaCall};

/// Errors that can occur when talking to the media host.
#[derive(Debug, Error)]
pub enum AssetError {
    /// HTTP request failed.
    #[error("media request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("media response error: {0}")]
    Response(String),

    /// The media host returned an error.
    #[error("media API error: {0}")]
    Api(String),

    /// No store identifier could be derived from the URL.
    #[error("cannot derive an asset id from {url}")]
    Unresolvable { url: String },

    /// Client configuration is incomplete.
    #[error("media host not configured: {0}")]
    NotConfigured(String),
}

/// An uploaded binary as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAsset {
    pub url: String,
    #[serde(rename = "publicId")]
    pub store_id: String,
}

impl From<StoredAsset> for Asset {
    fn from(stored: StoredAsset) -> Self {
        Self::with_store_id(stored.url, stored.store_id)
    }
}

/// How a delete target is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    /// A delivery URL; the store id is derived from it.
    Url(String),
    /// A store id known in advance; no derivation happens.
    StoreId(String),
}

impl From<&Asset> for AssetRef {
    fn from(asset: &Asset) -> Self {
        asset.known_store_id().map_or_else(
            || Self::Url(asset.url().to_owned()),
            |id| Self::StoreId(id.to_owned()),
        )
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::StoreId(id) => write!(f, "id:{id}"),
        }
    }
}

/// Result of a delete call. Deleting an absent asset is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

/// Key-addressed binary store.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload a binary into `folder`.
    async fn upload(&self, upload: &ImageUpload, folder: &str) -> Result<StoredAsset, AssetError>;

    /// Delete by store identifier.
    async fn destroy(&self, store_id: &str) -> Result<DeleteOutcome, AssetError>;

    /// Delete by URL or by known identifier.
    ///
    /// A [`AssetRef::StoreId`] bypasses URL resolution entirely.
    async fn delete(&self, target: &AssetRef) -> Result<DeleteOutcome, AssetError> {
        let store_id = match target {
            AssetRef::StoreId(id) => id.clone(),
            AssetRef::Url(url) => asset_id::resolve(url)
                .ok_or_else(|| AssetError::Unresolvable { url: url.clone() })?,
        };
        self.destroy(&store_id).await
    }
}
