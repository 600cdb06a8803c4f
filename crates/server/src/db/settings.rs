//! Settings repository over the `settings/general` singleton.

use tracing::warn;

use vitrine_core::{SETTINGS_DOCUMENT_ID, SettingsPatch, ShopSettings, StoredSettings};

use super::{Collection, RecordStore, RepositoryError, to_document};

/// Repository for the shop settings document.
pub struct SettingsRepository<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Read settings, defaulting every missing field.
    ///
    /// A document that cannot be read at all yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store query fails.
    pub async fn get(&self) -> Result<ShopSettings, RepositoryError> {
        let Some(data) = self
            .store
            .get(Collection::Settings, SETTINGS_DOCUMENT_ID)
            .await?
        else {
            return Ok(ShopSettings::default());
        };

        match serde_json::from_value::<StoredSettings>(serde_json::Value::Object(data)) {
            Ok(stored) => Ok(stored.into()),
            Err(e) => {
                warn!(error = %e, "Unreadable settings document, using defaults");
                Ok(ShopSettings::default())
            }
        }
    }

    /// Whether the settings document has ever been written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store query fails.
    pub async fn exists(&self) -> Result<bool, RepositoryError> {
        Ok(self
            .store
            .get(Collection::Settings, SETTINGS_DOCUMENT_ID)
            .await?
            .is_some())
    }

    /// Merge the keys present in `patch`; other stored keys are untouched.
    /// An empty patch writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    pub async fn patch(&self, patch: &SettingsPatch) -> Result<(), RepositoryError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.store
            .patch(Collection::Settings, SETTINGS_DOCUMENT_ID, to_document(patch)?)
            .await
    }
}
