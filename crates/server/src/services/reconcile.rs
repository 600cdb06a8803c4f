//! Asset reconciliation for image-bearing fields.
//!
//! Moving a field from its persisted state to a submitted state happens in two
//! phases:
//!
//! 1. **Stage** - upload every new binary and work out which previously bound
//!    assets lose their owner. A failed single-field upload aborts here, before
//!    anything is deleted or persisted. Failed gallery uploads are skipped.
//! 2. **Commit** (after the record write succeeded) - delete the released
//!    assets, best-effort. **Abandon** (the record write failed) - delete the
//!    fresh uploads instead, leaving the previous assets untouched.
//!
//! Deletes never fail the surrounding operation: failures and unresolvable
//! legacy URLs are logged and reported as [`SideEffect`]s.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use vitrine_core::{Asset, MultiAssetField, SingleAssetField};

use crate::media::{AssetError, AssetRef, AssetStore, DeleteOutcome};

/// One media host interaction performed during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SideEffect {
    /// A binary was uploaded.
    Uploaded { url: String },
    /// A gallery upload failed and was skipped.
    UploadFailed { filename: String, reason: String },
    /// An asset was deleted (or was already gone).
    Deleted { url: String },
    /// A delete was attempted and failed.
    DeleteFailed { url: String, reason: String },
    /// No store id could be derived, so no delete was attempted.
    DeleteSkipped { url: String },
}

/// Uploads done for a field, plus the deletes owed once the record is written.
#[derive(Debug)]
#[must_use = "staged uploads must be committed or abandoned"]
pub struct Staged<T> {
    /// Value to persist.
    pub value: T,
    side_effects: Vec<SideEffect>,
    uploaded: Vec<Asset>,
    released: Vec<Asset>,
}

impl<T> Staged<T> {
    /// Side effects performed so far.
    #[must_use]
    pub fn side_effects(&self) -> &[SideEffect] {
        &self.side_effects
    }

    /// Assets that will be deleted on commit.
    #[must_use]
    pub fn released(&self) -> &[Asset] {
        &self.released
    }
}

/// Final value of a field and every side effect that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled<T> {
    pub value: T,
    pub side_effects: Vec<SideEffect>,
}

/// Executes asset store operations for field transitions.
pub struct AssetReconciler<'a> {
    store: &'a dyn AssetStore,
    folder: &'a str,
}

impl<'a> AssetReconciler<'a> {
    /// Create a reconciler uploading into `folder`.
    #[must_use]
    pub const fn new(store: &'a dyn AssetStore, folder: &'a str) -> Self {
        Self { store, folder }
    }

    /// Stage a single-asset field.
    ///
    /// `previous` must come from the stored record, never from the client.
    /// `PendingClear` and `Empty` both release `previous`, and `Bound` keeps
    /// it; the asset carried inside a client-side state is ignored.
    ///
    /// # Errors
    ///
    /// Returns the upload error for a failed replacement. Nothing has been
    /// deleted at that point.
    #[instrument(skip_all, fields(previous = previous.map(Asset::url)))]
    pub async fn stage_single(
        &self,
        previous: Option<&Asset>,
        next: SingleAssetField,
    ) -> Result<Staged<Option<String>>, AssetError> {
        let mut staged = Staged {
            value: None,
            side_effects: Vec::new(),
            uploaded: Vec::new(),
            released: Vec::new(),
        };

        let bound = match next {
            SingleAssetField::PendingReplace { upload, .. } => {
                let stored = self.store.upload(&upload, self.folder).await.map_err(|e| {
                    warn!(filename = %upload.filename, error = %e, "Image upload failed");
                    e
                })?;
                staged.side_effects.push(SideEffect::Uploaded {
                    url: stored.url.clone(),
                });
                let asset = Asset::from(stored);
                staged.uploaded.push(asset.clone());
                Some(asset)
            }
            SingleAssetField::Bound(_) => previous.cloned(),
            SingleAssetField::Empty | SingleAssetField::PendingClear(_) => None,
        };

        if let Some(previous) = previous
            && bound.as_ref().is_none_or(|b| b.url() != previous.url())
        {
            staged.released.push(previous.clone());
        }

        staged.value = bound.map(Asset::into_url);
        Ok(staged)
    }

    /// Stage a gallery field.
    ///
    /// Previous URLs missing from the kept list are released. Pending binaries
    /// are uploaded in order; a failed upload is skipped and the rest continue.
    /// The value is the kept URLs followed by the uploaded ones.
    #[instrument(skip_all, fields(previous = previous.len()))]
    pub async fn stage_multi(&self, previous: &[Asset], next: MultiAssetField) -> Staged<Vec<String>> {
        let (kept, pending_adds) = next.into_parts();
        let mut staged = Staged {
            value: Vec::with_capacity(kept.len() + pending_adds.len()),
            side_effects: Vec::new(),
            uploaded: Vec::new(),
            released: Vec::new(),
        };

        let kept_urls: HashSet<&str> = kept.iter().map(Asset::url).collect();
        staged.released = previous
            .iter()
            .filter(|asset| !kept_urls.contains(asset.url()))
            .cloned()
            .collect();

        staged.value.extend(kept.into_iter().map(Asset::into_url));

        for upload in &pending_adds {
            match self.store.upload(upload, self.folder).await {
                Ok(stored) => {
                    staged.side_effects.push(SideEffect::Uploaded {
                        url: stored.url.clone(),
                    });
                    staged.value.push(stored.url.clone());
                    staged.uploaded.push(Asset::from(stored));
                }
                Err(e) => {
                    warn!(filename = %upload.filename, error = %e, "Skipping failed gallery upload");
                    staged.side_effects.push(SideEffect::UploadFailed {
                        filename: upload.filename.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        staged
    }

    /// Finish a staged field after its record was written: delete released assets.
    pub async fn commit<T>(&self, staged: Staged<T>) -> Reconciled<T> {
        let Staged {
            value,
            mut side_effects,
            released,
            ..
        } = staged;

        for asset in &released {
            side_effects.push(self.release(asset).await);
        }

        Reconciled {
            value,
            side_effects,
        }
    }

    /// Roll back a staged field whose record write failed: delete its fresh uploads.
    pub async fn abandon<T>(&self, staged: Staged<T>) -> Vec<SideEffect> {
        let Staged {
            mut side_effects,
            uploaded,
            ..
        } = staged;

        for asset in &uploaded {
            side_effects.push(self.release(asset).await);
        }
        side_effects
    }

    /// Stage and commit a single-asset field in one step.
    ///
    /// # Errors
    ///
    /// Returns the upload error for a failed replacement; no delete happens.
    pub async fn reconcile_single(
        &self,
        previous: Option<&Asset>,
        next: SingleAssetField,
    ) -> Result<Reconciled<Option<String>>, AssetError> {
        let staged = self.stage_single(previous, next).await?;
        Ok(self.commit(staged).await)
    }

    /// Stage and commit a gallery field in one step.
    pub async fn reconcile_multi(
        &self,
        previous: &[Asset],
        next: MultiAssetField,
    ) -> Reconciled<Vec<String>> {
        let staged = self.stage_multi(previous, next).await;
        self.commit(staged).await
    }

    /// Best-effort delete.
    async fn release(&self, asset: &Asset) -> SideEffect {
        let url = asset.url().to_owned();
        match self.store.delete(&AssetRef::from(asset)).await {
            Ok(outcome) => {
                if outcome == DeleteOutcome::AlreadyAbsent {
                    debug!(url = %url, "Asset was already absent");
                }
                SideEffect::Deleted { url }
            }
            Err(AssetError::Unresolvable { .. }) => {
                warn!(url = %url, "Cannot derive asset id, leaving asset in place");
                SideEffect::DeleteSkipped { url }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Asset delete failed, leaving orphan");
                SideEffect::DeleteFailed {
                    url,
                    reason: e.to_string(),
                }
            }
        }
    }
}
