//! Seed the settings document.
//!
//! Writes the documented defaults when no settings document exists yet, so
//! the admin editor starts from a complete record. An existing document is
//! left alone.

use tracing::info;

use vitrine_core::{SettingsPatch, ShopSettings};
use vitrine_server::db::{self, PgRecordStore, SettingsRepository};

use super::{CliError, database_url};

/// Seed default settings if absent.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or the write fails.
pub async fn settings() -> Result<(), CliError> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    let store = PgRecordStore::new(pool);
    let repo = SettingsRepository::new(&store);

    if repo.exists().await? {
        info!("Settings document already exists, nothing to seed");
        return Ok(());
    }

    repo.patch(&defaults_patch()).await?;
    info!("Seeded default settings");
    Ok(())
}

/// Patch writing every scalar default plus the category list.
fn defaults_patch() -> SettingsPatch {
    let defaults = ShopSettings::default();
    SettingsPatch {
        shop_name: Some(defaults.shop_name),
        theme: Some(defaults.theme),
        logo_shape: Some(defaults.logo_shape),
        logo_size: Some(defaults.logo_size),
        banner_height: Some(defaults.banner_height),
        categories: Some(defaults.categories),
        ..SettingsPatch::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vitrine_server::db::MemoryRecordStore;

    use super::*;

    #[tokio::test]
    async fn test_defaults_patch_reads_back_as_defaults() {
        let store = MemoryRecordStore::new();
        let repo = SettingsRepository::new(&store);

        repo.patch(&defaults_patch()).await.unwrap();

        assert!(repo.exists().await.unwrap());
        assert_eq!(repo.get().await.unwrap(), ShopSettings::default());
    }
}
