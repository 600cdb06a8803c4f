//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;
use url::Url;

use crate::config::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOAD_FOLDER, VitrineConfig};
use crate::db::RecordStore;
use crate::media::AssetStore;
use crate::services::{ProductService, SettingsService};

/// The subset of configuration handlers need at request time.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Public origin used in robots.txt and the sitemap.
    pub base_url: Url,
    /// Bearer token accepted on admin routes.
    pub admin_token: SecretString,
    /// Media host folder for editor uploads.
    pub upload_folder: String,
    /// Request body cap for uploads.
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    /// Build a config with default folder and upload limit.
    #[must_use]
    pub fn new(base_url: Url, admin_token: SecretString) -> Self {
        Self {
            base_url,
            admin_token,
            upload_folder: DEFAULT_UPLOAD_FOLDER.to_owned(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl From<&VitrineConfig> for ServiceConfig {
    fn from(config: &VitrineConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            admin_token: config.admin_token.clone(),
            upload_folder: config.cloudinary.upload_folder.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Stores are trait objects so tests can run the
/// router against in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServiceConfig,
    records: Arc<dyn RecordStore>,
    assets: Arc<dyn AssetStore>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: ServiceConfig,
        records: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                records,
                assets,
            }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Get a reference to the record store.
    #[must_use]
    pub fn records(&self) -> &dyn RecordStore {
        self.inner.records.as_ref()
    }

    /// Get a reference to the media host.
    #[must_use]
    pub fn assets(&self) -> &dyn AssetStore {
        self.inner.assets.as_ref()
    }

    /// Product editor bound to this state's stores.
    #[must_use]
    pub fn products(&self) -> ProductService<'_> {
        ProductService::new(
            self.records(),
            self.assets(),
            &self.inner.config.upload_folder,
        )
    }

    /// Settings editor bound to this state's stores.
    #[must_use]
    pub fn settings(&self) -> SettingsService<'_> {
        SettingsService::new(
            self.records(),
            self.assets(),
            &self.inner.config.upload_folder,
        )
    }
}
