//! Recording asset store for tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use vitrine_core::ImageUpload;

use super::{AssetError, AssetStore, DeleteOutcome, StoredAsset};

const FAKE_HOST: &str = "https://res.cloudinary.test/demo/image/upload";

/// One call observed by [`FakeAssetStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCall {
    /// Upload of a file name into a folder (attempted, successful or not).
    Upload { filename: String, folder: String },
    /// Delete by store id (attempted, successful or not).
    Destroy(String),
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<MediaCall>,
    live: HashSet<String>,
    failing_uploads: HashSet<String>,
    failing_deletes: HashSet<String>,
    uploads: usize,
}

/// In-memory [`AssetStore`] that records every call.
///
/// Uploaded files get the URL `{host}/v{n}/{folder}/{stem}.{ext}` so that
/// the id resolver recovers `{folder}/{stem}`.
#[derive(Debug, Default)]
pub struct FakeAssetStore {
    state: Mutex<FakeState>,
}

impl FakeAssetStore {
    /// Create an empty fake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make uploads of `filename` fail.
    #[must_use]
    pub fn failing_upload(self, filename: &str) -> Self {
        self.with_state(|s| {
            s.failing_uploads.insert(filename.to_owned());
        });
        self
    }

    /// Make deletes of `store_id` fail.
    #[must_use]
    pub fn failing_delete(self, store_id: &str) -> Self {
        self.with_state(|s| {
            s.failing_deletes.insert(store_id.to_owned());
        });
        self
    }

    /// Mark a store id as present, as if uploaded earlier.
    pub fn seed(&self, store_id: &str) {
        self.with_state(|s| {
            s.live.insert(store_id.to_owned());
        });
    }

    /// All calls so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MediaCall> {
        self.with_state(|s| s.calls.clone())
    }

    /// Ids of delete calls so far.
    #[must_use]
    pub fn destroyed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MediaCall::Destroy(id) => Some(id),
                MediaCall::Upload { .. } => None,
            })
            .collect()
    }

    /// Whether `store_id` is currently held.
    #[must_use]
    pub fn is_live(&self, store_id: &str) -> bool {
        self.with_state(|s| s.live.contains(store_id))
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}

#[async_trait]
impl AssetStore for FakeAssetStore {
    async fn upload(&self, upload: &ImageUpload, folder: &str) -> Result<StoredAsset, AssetError> {
        self.with_state(|s| {
            s.calls.push(MediaCall::Upload {
                filename: upload.filename.clone(),
                folder: folder.to_owned(),
            });
            if s.failing_uploads.contains(&upload.filename) {
                return Err(AssetError::Api(format!("upload of {} rejected", upload.filename)));
            }

            s.uploads += 1;
            let (stem, ext) = upload
                .filename
                .rsplit_once('.')
                .unwrap_or((upload.filename.as_str(), "bin"));
            let store_id = format!("{folder}/{stem}-{}", s.uploads);
            s.live.insert(store_id.clone());
            Ok(StoredAsset {
                url: format!("{FAKE_HOST}/v{}/{store_id}.{ext}", s.uploads),
                store_id,
            })
        })
    }

    async fn destroy(&self, store_id: &str) -> Result<DeleteOutcome, AssetError> {
        self.with_state(|s| {
            s.calls.push(MediaCall::Destroy(store_id.to_owned()));
            if s.failing_deletes.contains(store_id) {
                return Err(AssetError::Request("connection reset".to_owned()));
            }
            Ok(if s.live.remove(store_id) {
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::AlreadyAbsent
            })
        })
    }
}
