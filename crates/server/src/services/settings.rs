//! Settings editor operations.
//!
//! Every write is a merge-patch of the settings document: fields the form does
//! not carry keep their stored value. Logo and banner are reconciled
//! independently, so a failed banner upload never blocks a logo change.

use serde::Serialize;
use tracing::{info, instrument, warn};

use vitrine_core::editor::SettingsSubmission;
use vitrine_core::{
    AppearanceForm, Asset, MultiAssetField, SettingsPatch, ShopSettings, SingleAssetField,
    SlidesForm, SocialForm, normalize_map_embed, with_category_added, with_category_removed,
};

use super::ServiceError;
use super::reconcile::{AssetReconciler, SideEffect, Staged};
use crate::db::{ProductRepository, RecordStore, SettingsRepository};
use crate::media::AssetStore;

/// Result of an appearance save.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceOutcome {
    pub settings: ShopSettings,
    /// Image fields (`logo`, `banner`) whose upload failed and kept their previous value.
    pub failed_fields: Vec<&'static str>,
}

/// Result of a slides save.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlidesOutcome {
    pub settings: ShopSettings,
    /// File names of slides that failed to upload and were skipped.
    pub failed_uploads: Vec<String>,
}

/// Result of a full settings editor submit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSaveOutcome {
    pub settings: ShopSettings,
    pub failed_fields: Vec<&'static str>,
    pub failed_uploads: Vec<String>,
}

/// Shop settings writes against the record and asset stores.
pub struct SettingsService<'a> {
    records: &'a dyn RecordStore,
    assets: &'a dyn AssetStore,
    folder: &'a str,
}

impl<'a> SettingsService<'a> {
    /// Create a settings service uploading images into `folder`.
    #[must_use]
    pub const fn new(
        records: &'a dyn RecordStore,
        assets: &'a dyn AssetStore,
        folder: &'a str,
    ) -> Self {
        Self {
            records,
            assets,
            folder,
        }
    }

    const fn repo(&self) -> SettingsRepository<'a> {
        SettingsRepository::new(self.records)
    }

    const fn reconciler(&self) -> AssetReconciler<'a> {
        AssetReconciler::new(self.assets, self.folder)
    }

    /// Current settings with every missing field defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store query fails.
    pub async fn get(&self) -> Result<ShopSettings, ServiceError> {
        Ok(self.repo().get().await?)
    }

    /// Save the appearance tab.
    ///
    /// A failed logo or banner upload keeps that field's previous value and is
    /// reported in [`AppearanceOutcome::failed_fields`]; everything else is saved.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank shop name or a zero size (nothing changed).
    /// - `Repository` if the patch fails (fresh uploads are removed again).
    #[instrument(skip_all)]
    pub async fn update_appearance(
        &self,
        form: AppearanceForm,
    ) -> Result<AppearanceOutcome, ServiceError> {
        if form.shop_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ServiceError::Validation("shopName cannot be empty".to_owned()));
        }
        if form.logo_size == Some(0) {
            return Err(ServiceError::Validation("logoSize must be positive".to_owned()));
        }
        if form.banner_height == Some(0) {
            return Err(ServiceError::Validation(
                "bannerHeight must be positive".to_owned(),
            ));
        }

        let repo = self.repo();
        let mut settings = repo.get().await?;
        let reconciler = self.reconciler();

        let mut failed_fields = Vec::new();
        let logo = stage_image(
            &reconciler,
            "logo",
            settings.logo_url.as_deref(),
            form.logo,
            &mut failed_fields,
        )
        .await;
        let banner = stage_image(
            &reconciler,
            "banner",
            settings.banner_url.as_deref(),
            form.banner,
            &mut failed_fields,
        )
        .await;

        let patch = SettingsPatch {
            shop_name: form.shop_name.map(|n| n.trim().to_owned()),
            theme: form.theme,
            logo_shape: form.logo_shape,
            logo_size: form.logo_size,
            banner_height: form.banner_height,
            logo_url: logo.as_ref().map(|s| s.value.clone().unwrap_or_default()),
            banner_url: banner.as_ref().map(|s| s.value.clone().unwrap_or_default()),
            ..SettingsPatch::default()
        };

        let staged: Vec<_> = [logo, banner].into_iter().flatten().collect();
        if let Err(e) = repo.patch(&patch).await {
            for field in staged {
                reconciler.abandon(field).await;
            }
            return Err(e.into());
        }
        for field in staged {
            reconciler.commit(field).await;
        }

        patch.apply_to(&mut settings);
        info!(failed = failed_fields.len(), "Appearance saved");
        Ok(AppearanceOutcome {
            settings,
            failed_fields,
        })
    }

    /// Save the social links tab.
    ///
    /// Values are trimmed; blank clears a link. A pasted `<iframe>` map snippet
    /// is reduced to its `src` URL.
    ///
    /// # Errors
    ///
    /// - `Validation` for an iframe snippet without `src`.
    /// - `Repository` if the patch fails.
    #[instrument(skip_all)]
    pub async fn update_social(&self, form: SocialForm) -> Result<ShopSettings, ServiceError> {
        let map_embed_url = form
            .map_embed_url
            .map(|input| normalize_map_embed(&input).map(Option::unwrap_or_default))
            .transpose()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let patch = SettingsPatch {
            facebook_url: form.facebook_url.map(|u| u.trim().to_owned()),
            tiktok_url: form.tiktok_url.map(|u| u.trim().to_owned()),
            map_embed_url,
            ..SettingsPatch::default()
        };

        let repo = self.repo();
        let mut settings = repo.get().await?;
        repo.patch(&patch).await?;
        patch.apply_to(&mut settings);
        Ok(settings)
    }

    /// Save the slide gallery.
    ///
    /// Kept URLs that are not currently stored are dropped. Failed uploads are
    /// skipped and reported in [`SlidesOutcome::failed_uploads`].
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the patch fails (fresh uploads are removed again).
    #[instrument(skip_all)]
    pub async fn update_slides(&self, form: SlidesForm) -> Result<SlidesOutcome, ServiceError> {
        let repo = self.repo();
        let mut settings = repo.get().await?;
        let previous: Vec<Asset> = settings.slide_urls.iter().map(Asset::new).collect();

        let (kept, pending_adds) = form.slides.into_parts();
        let kept: Vec<Asset> = kept
            .into_iter()
            .filter(|asset| {
                let stored = previous.iter().any(|p| p.url() == asset.url());
                if !stored {
                    warn!(url = %asset.url(), "Ignoring kept slide that is not stored");
                }
                stored
            })
            .collect();

        let reconciler = self.reconciler();
        let staged = reconciler
            .stage_multi(&previous, MultiAssetField::with_changes(kept, pending_adds))
            .await;

        let failed_uploads = staged
            .side_effects()
            .iter()
            .filter_map(|effect| match effect {
                SideEffect::UploadFailed { filename, .. } => Some(filename.clone()),
                _ => None,
            })
            .collect();

        let patch = SettingsPatch {
            slide_urls: Some(staged.value.clone()),
            ..SettingsPatch::default()
        };

        if let Err(e) = repo.patch(&patch).await {
            reconciler.abandon(staged).await;
            return Err(e.into());
        }
        reconciler.commit(staged).await;

        patch.apply_to(&mut settings);
        Ok(SlidesOutcome {
            settings,
            failed_uploads,
        })
    }

    /// Append a category. Blank or already listed names leave the list unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store read or write fails.
    #[instrument(skip(self))]
    pub async fn add_category(&self, name: &str) -> Result<Vec<String>, ServiceError> {
        let repo = self.repo();
        let settings = repo.get().await?;

        let Some(categories) = with_category_added(&settings.categories, name) else {
            return Ok(settings.categories);
        };

        repo.patch(&SettingsPatch {
            categories: Some(categories.clone()),
            ..SettingsPatch::default()
        })
        .await?;
        info!("Category added");
        Ok(categories)
    }

    /// Remove a category no product uses.
    ///
    /// The product set is read from the store on every call. Products without
    /// a category count as `General`.
    ///
    /// # Errors
    ///
    /// - `CategoryInUse` if any product is in the category.
    /// - `NotFound` if the category is not listed.
    /// - `Repository` if the store read or write fails.
    #[instrument(skip(self))]
    pub async fn remove_category(&self, name: &str) -> Result<Vec<String>, ServiceError> {
        let products = ProductRepository::new(self.records).list().await?;
        let in_use = products.iter().filter(|p| p.in_category(name)).count();
        if in_use > 0 {
            return Err(ServiceError::CategoryInUse {
                name: name.to_owned(),
                products: in_use,
            });
        }

        let repo = self.repo();
        let settings = repo.get().await?;
        let categories = with_category_removed(&settings.categories, name)
            .ok_or_else(|| ServiceError::NotFound(format!("category '{name}'")))?;

        repo.patch(&SettingsPatch {
            categories: Some(categories.clone()),
            ..SettingsPatch::default()
        })
        .await?;
        info!("Category removed");
        Ok(categories)
    }

    /// Execute a submission produced by the settings editor: appearance, then
    /// social links, then slides.
    ///
    /// # Errors
    ///
    /// Stops at the first hard failure of [`Self::update_appearance`],
    /// [`Self::update_social`] or [`Self::update_slides`].
    pub async fn submit(
        &self,
        submission: SettingsSubmission,
    ) -> Result<SettingsSaveOutcome, ServiceError> {
        let appearance = self.update_appearance(submission.appearance).await?;
        self.update_social(submission.social).await?;
        let slides = self.update_slides(submission.slides).await?;

        Ok(SettingsSaveOutcome {
            settings: slides.settings,
            failed_fields: appearance.failed_fields,
            failed_uploads: slides.failed_uploads,
        })
    }
}

/// Stage one image field. `None` when untouched or when its upload failed.
async fn stage_image(
    reconciler: &AssetReconciler<'_>,
    name: &'static str,
    previous: Option<&str>,
    field: Option<SingleAssetField>,
    failed_fields: &mut Vec<&'static str>,
) -> Option<Staged<Option<String>>> {
    let field = field?;
    let previous = previous.map(Asset::new);
    match reconciler.stage_single(previous.as_ref(), field).await {
        Ok(staged) => Some(staged),
        Err(e) => {
            warn!(field = name, error = %e, "Keeping previous image after failed upload");
            failed_fields.push(name);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use vitrine_core::{ImageUpload, Theme};

    use super::*;
    use crate::db::{Collection, MemoryRecordStore};
    use crate::media::FakeAssetStore;

    const FOLDER: &str = "shop-products";

    fn upload(name: &str) -> ImageUpload {
        ImageUpload::new(name, Some("image/png".into()), vec![7; 8])
    }

    fn cdn(path: &str) -> String {
        format!("https://res.cloudinary.com/demo/image/upload/v1/{path}.png")
    }

    async fn seed(records: &MemoryRecordStore, fields: serde_json::Value) {
        let serde_json::Value::Object(map) = fields else {
            panic!("fields must be an object");
        };
        records
            .put(Collection::Settings, Some("general"), map)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_defaults_without_document() {
        let (records, assets) = (MemoryRecordStore::new(), FakeAssetStore::new());
        let settings = SettingsService::new(&records, &assets, FOLDER)
            .get()
            .await
            .unwrap();
        assert_eq!(settings, ShopSettings::default());
    }

    #[tokio::test]
    async fn test_banner_failure_does_not_block_logo() {
        let records = MemoryRecordStore::new();
        let assets = FakeAssetStore::new().failing_upload("banner.png");
        seed(
            &records,
            json!({ "logoUrl": cdn("shop-products/logo-old"), "bannerUrl": cdn("shop-products/banner-old") }),
        )
        .await;
        let service = SettingsService::new(&records, &assets, FOLDER);

        let outcome = service
            .update_appearance(AppearanceForm {
                theme: Some(Theme::Light),
                logo: Some(SingleAssetField::Empty.replace_with(upload("logo.png"))),
                banner: Some(SingleAssetField::Empty.replace_with(upload("banner.png"))),
                ..AppearanceForm::default()
            })
            .await
            .unwrap();

        assert_eq!(outcome.failed_fields, ["banner"]);
        assert!(outcome.settings.logo_url.unwrap().ends_with("shop-products/logo-1.png"));
        assert_eq!(
            outcome.settings.banner_url.as_deref(),
            Some(cdn("shop-products/banner-old").as_str())
        );
        assert_eq!(assets.destroyed(), ["shop-products/logo-old"]);

        let stored = service.get().await.unwrap();
        assert_eq!(stored.theme, Theme::Light);
        assert_eq!(stored.banner_url, Some(cdn("shop-products/banner-old")));
    }

    #[tokio::test]
    async fn test_appearance_validation_touches_nothing() {
        let (records, assets) = (MemoryRecordStore::new(), FakeAssetStore::new());
        let service = SettingsService::new(&records, &assets, FOLDER);

        let err = service
            .update_appearance(AppearanceForm {
                logo_size: Some(0),
                logo: Some(SingleAssetField::Empty.replace_with(upload("logo.png"))),
                ..AppearanceForm::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(assets.calls().is_empty());
        assert_eq!(records.operations(), 0);
    }

    #[tokio::test]
    async fn test_partial_write_keeps_other_fields() {
        let (records, assets) = (MemoryRecordStore::new(), FakeAssetStore::new());
        let service = SettingsService::new(&records, &assets, FOLDER);
        service
            .update_appearance(AppearanceForm {
                shop_name: Some("Atelier".into()),
                banner_height: Some(420),
                logo: Some(SingleAssetField::Empty.replace_with(upload("logo.png"))),
                ..AppearanceForm::default()
            })
            .await
            .unwrap();

        service
            .update_appearance(AppearanceForm {
                banner_height: Some(500),
                ..AppearanceForm::default()
            })
            .await
            .unwrap();

        let settings = service.get().await.unwrap();
        assert_eq!(settings.banner_height, 500);
        assert_eq!(settings.shop_name, "Atelier");
        assert!(settings.logo_url.is_some());
        assert_eq!(assets.destroyed().len(), 0);
    }

    #[tokio::test]
    async fn test_social_normalizes_iframe_and_clears_blank() {
        let (records, assets) = (MemoryRecordStore::new(), FakeAssetStore::new());
        seed(&records, json!({ "tiktokUrl": "https://tiktok.test/@shop" })).await;
        let service = SettingsService::new(&records, &assets, FOLDER);

        let settings = service
            .update_social(SocialForm {
                facebook_url: Some(" https://facebook.test/shop ".into()),
                tiktok_url: Some("  ".into()),
                map_embed_url: Some(r#"<iframe src="https://maps.test/embed?pb=1"></iframe>"#.into()),
            })
            .await
            .unwrap();

        assert_eq!(settings.facebook_url.as_deref(), Some("https://facebook.test/shop"));
        assert_eq!(settings.tiktok_url, None);
        assert_eq!(settings.map_embed_url.as_deref(), Some("https://maps.test/embed?pb=1"));
        assert_eq!(service.get().await.unwrap(), settings);

        let err = service
            .update_social(SocialForm {
                map_embed_url: Some("<iframe></iframe>".into()),
                ..SocialForm::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_slides_drop_removed_and_skip_failed_upload() {
        let records = MemoryRecordStore::new();
        let assets = FakeAssetStore::new().failing_upload("x.png");
        let (a, b, c) = (cdn("s/a"), cdn("s/b"), cdn("s/c"));
        seed(&records, json!({ "slideUrls": [a, b, c] })).await;
        let service = SettingsService::new(&records, &assets, FOLDER);

        let mut slides = MultiAssetField::from_urls([a.clone(), b.clone(), c.clone()]);
        slides.remove_existing(&b);
        slides.add_pending(upload("x.png"));
        slides.add_pending(upload("y.png"));

        let outcome = service.update_slides(SlidesForm { slides }).await.unwrap();

        assert_eq!(outcome.failed_uploads, ["x.png"]);
        assert_eq!(outcome.settings.slide_urls.len(), 3);
        assert_eq!(outcome.settings.slide_urls[..2], [a, c]);
        assert!(outcome.settings.slide_urls[2].ends_with("shop-products/y-1.png"));
        assert_eq!(assets.destroyed(), ["s/b"]);
        assert_eq!(service.get().await.unwrap().slide_urls, outcome.settings.slide_urls);
    }

    #[tokio::test]
    async fn test_slides_ignore_foreign_kept_urls() {
        let (records, assets) = (MemoryRecordStore::new(), FakeAssetStore::new());
        let service = SettingsService::new(&records, &assets, FOLDER);

        let outcome = service
            .update_slides(SlidesForm {
                slides: MultiAssetField::from_urls(["https://elsewhere.test/x.png"]),
            })
            .await
            .unwrap();

        assert!(outcome.settings.slide_urls.is_empty());
    }

    #[tokio::test]
    async fn test_add_blank_category_is_noop() {
        let (records, assets) = (MemoryRecordStore::new(), FakeAssetStore::new());
        let service = SettingsService::new(&records, &assets, FOLDER);
        let before = service.get().await.unwrap().categories;

        assert_eq!(service.add_category("").await.unwrap(), before);
        assert_eq!(service.add_category("   ").await.unwrap(), before);
        assert_eq!(records.writes(), 0);

        let added = service.add_category("Toys").await.unwrap();
        assert_eq!(added.len(), before.len() + 1);
        assert_eq!(service.get().await.unwrap().categories, added);
    }

    #[tokio::test]
    async fn test_remove_category_in_use_counts_absent_as_general() {
        let (records, assets) = (MemoryRecordStore::new(), FakeAssetStore::new());
        let serde_json::Value::Object(product) = json!({ "name": "Mug", "description": "Clay" })
        else {
            unreachable!()
        };
        records.put(Collection::Products, None, product).await.unwrap();
        let service = SettingsService::new(&records, &assets, FOLDER);

        let err = service.remove_category("General").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::CategoryInUse { ref name, products: 1 } if name == "General"
        ));

        let before = service.get().await.unwrap().categories;
        let after = service.remove_category("Art").await.unwrap();
        assert_eq!(after.len(), before.len() - 1);
        assert!(!after.iter().any(|c| c == "Art"));

        let err = service.remove_category("Art").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_editor_submission_saves_every_tab() {
        use vitrine_core::editor::{SettingsEditorEvent, SettingsEditorState};

        let (records, assets) = (MemoryRecordStore::new(), FakeAssetStore::new());
        let service = SettingsService::new(&records, &assets, FOLDER);

        let mut editor = SettingsEditorState::default();
        editor
            .apply(SettingsEditorEvent::Open(service.get().await.unwrap()))
            .unwrap();
        for event in [
            SettingsEditorEvent::SetShopName("Atelier".into()),
            SettingsEditorEvent::SetTheme(Theme::Light),
            SettingsEditorEvent::SetTiktokUrl("https://tiktok.com/@atelier".into()),
            SettingsEditorEvent::AddSlide(upload("s1.png")),
        ] {
            editor.apply(event).unwrap();
        }
        let submission = editor.apply(SettingsEditorEvent::Submit).unwrap().unwrap();

        let outcome = service.submit(submission).await.unwrap();

        assert_eq!(outcome.settings.shop_name, "Atelier");
        assert_eq!(outcome.settings.theme, Theme::Light);
        assert_eq!(
            outcome.settings.tiktok_url.as_deref(),
            Some("https://tiktok.com/@atelier")
        );
        assert_eq!(outcome.settings.slide_urls.len(), 1);
        assert!(outcome.failed_fields.is_empty());
        assert!(outcome.failed_uploads.is_empty());
        assert!(assets.destroyed().is_empty());
    }

    #[tokio::test]
    async fn test_failed_record_write_removes_fresh_logo() {
        let (records, assets) = (MemoryRecordStore::new(), FakeAssetStore::new());
        assets.seed("shop-products/logo-old");
        seed(&records, json!({ "shopName": "Atelier", "logoUrl": cdn("shop-products/logo-old") })).await;
        let service = SettingsService::new(&records, &assets, FOLDER);

        records.set_failing_writes(true);
        let err = service
            .update_appearance(AppearanceForm {
                shop_name: Some("Renamed".into()),
                logo: Some(SingleAssetField::Empty.replace_with(upload("logo.png"))),
                ..AppearanceForm::default()
            })
            .await
            .unwrap_err();
        records.set_failing_writes(false);

        assert!(matches!(err, ServiceError::Repository(_)));
        assert_eq!(assets.destroyed(), ["shop-products/logo-1"]);
        assert!(assets.is_live("shop-products/logo-old"));
        let stored = service.get().await.unwrap();
        assert_eq!(stored.shop_name, "Atelier");
        assert_eq!(stored.logo_url, Some(cdn("shop-products/logo-old")));
    }

    #[tokio::test]
    async fn test_stale_editor_session_keeps_newer_logo() {
        use vitrine_core::editor::{SettingsEditorEvent, SettingsEditorState};

        let (records, assets) = (MemoryRecordStore::new(), FakeAssetStore::new());
        assets.seed("shop-products/l1");
        seed(&records, json!({ "logoUrl": cdn("shop-products/l1") })).await;
        let service = SettingsService::new(&records, &assets, FOLDER);

        // Opened before another admin replaces the logo.
        let mut stale = SettingsEditorState::default();
        stale
            .apply(SettingsEditorEvent::Open(service.get().await.unwrap()))
            .unwrap();

        service
            .update_appearance(AppearanceForm {
                logo: Some(SingleAssetField::Empty.replace_with(upload("l2.png"))),
                ..AppearanceForm::default()
            })
            .await
            .unwrap();

        stale
            .apply(SettingsEditorEvent::SetShopName("Renamed".into()))
            .unwrap();
        let submission = stale.apply(SettingsEditorEvent::Submit).unwrap().unwrap();
        let outcome = service.submit(submission).await.unwrap();

        assert_eq!(outcome.settings.shop_name, "Renamed");
        assert!(outcome.settings.logo_url.unwrap().ends_with("shop-products/l2-1.png"));
        assert!(assets.is_live("shop-products/l2-1"));
        assert_eq!(assets.destroyed(), ["shop-products/l1"]);
    }
}
