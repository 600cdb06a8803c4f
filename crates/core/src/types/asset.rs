//! Image asset references and the per-field edit states built on them.
//!
//! An [`Asset`] is a pointer to a binary held by the media host. Records only
//! persist the URL; the host identifier is derived on demand through
//! [`crate::asset_id::resolve`] unless the host returned it at upload time.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::asset_id;

/// A stored image, addressed by its public delivery URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    url: String,
    store_id: Option<String>,
}

impl Asset {
    /// Wrap a persisted URL. The store identifier is resolved lazily.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            store_id: None,
        }
    }

    /// Wrap a freshly uploaded asset whose identifier the host already reported.
    #[must_use]
    pub fn with_store_id(url: impl Into<String>, store_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            store_id: Some(store_id.into()),
        }
    }

    /// The public delivery URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The identifier the host was given at upload time, if known.
    #[must_use]
    pub fn known_store_id(&self) -> Option<&str> {
        self.store_id.as_deref()
    }

    /// The host identifier: the known one, else the one resolved from the URL.
    #[must_use]
    pub fn store_id(&self) -> Option<String> {
        self.store_id
            .clone()
            .or_else(|| asset_id::resolve(&self.url))
    }

    /// Consume the asset, keeping only its URL.
    #[must_use]
    pub fn into_url(self) -> String {
        self.url
    }
}

// Only the URL is ever persisted.
impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.url)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// A binary waiting to be uploaded to the media host.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name as supplied by the client.
    pub filename: String,
    /// MIME type declared by the client, if any.
    pub content_type: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Create a pending upload.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes,
        }
    }

    /// Size of the payload in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Edit state of a field holding at most one image (product image, logo, banner).
///
/// `Empty` and `Bound` are persisted states; the `Pending*` variants only
/// exist client-side between opening an editor and submitting it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SingleAssetField {
    /// No image.
    #[default]
    Empty,
    /// Points at a stored image.
    Bound(Asset),
    /// A new binary will replace whatever the field held (`old` is `None` when empty).
    PendingReplace {
        /// The image being replaced, as the client last saw it.
        old: Option<Asset>,
        /// The replacement binary.
        upload: ImageUpload,
    },
    /// The stored image will be removed.
    PendingClear(Asset),
}

impl SingleAssetField {
    /// Build the persisted state from an optional URL.
    #[must_use]
    pub fn from_url(url: Option<&str>) -> Self {
        url.map_or(Self::Empty, |u| Self::Bound(Asset::new(u)))
    }

    /// The persisted image this field currently refers to, ignoring pending edits.
    #[must_use]
    pub const fn persisted(&self) -> Option<&Asset> {
        match self {
            Self::Empty => None,
            Self::Bound(asset) | Self::PendingClear(asset) => Some(asset),
            Self::PendingReplace { old, .. } => old.as_ref(),
        }
    }

    /// Whether the field carries an edit that needs a submit to take effect.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::PendingReplace { .. } | Self::PendingClear(_))
    }

    /// Stage a replacement binary.
    #[must_use]
    pub fn replace_with(self, upload: ImageUpload) -> Self {
        let old = self.persisted().cloned();
        Self::PendingReplace { old, upload }
    }

    /// Stage removal of the stored image. Clearing an empty field stays empty.
    #[must_use]
    pub fn clear(self) -> Self {
        match self.persisted().cloned() {
            Some(asset) => Self::PendingClear(asset),
            None => Self::Empty,
        }
    }

    /// Drop any pending edit, returning to the persisted state.
    #[must_use]
    pub fn discard(self) -> Self {
        match self.persisted().cloned() {
            Some(asset) => Self::Bound(asset),
            None => Self::Empty,
        }
    }
}

/// Edit state of an ordered image gallery (promotional slides).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiAssetField {
    kept: Vec<Asset>,
    pending_adds: Vec<ImageUpload>,
    removed: Vec<Asset>,
}

impl MultiAssetField {
    /// Start editing a persisted gallery.
    #[must_use]
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kept: urls.into_iter().map(|u| Asset::new(u)).collect(),
            pending_adds: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Build an edit directly from the images to keep and the binaries to append.
    #[must_use]
    pub const fn with_changes(kept: Vec<Asset>, pending_adds: Vec<ImageUpload>) -> Self {
        Self {
            kept,
            pending_adds,
            removed: Vec::new(),
        }
    }

    /// Images that stay, in display order.
    #[must_use]
    pub fn kept(&self) -> &[Asset] {
        &self.kept
    }

    /// Binaries to upload and append, in submission order.
    #[must_use]
    pub fn pending_adds(&self) -> &[ImageUpload] {
        &self.pending_adds
    }

    /// Images the editor marked for removal.
    #[must_use]
    pub fn removed(&self) -> &[Asset] {
        &self.removed
    }

    /// Queue a binary for upload.
    pub fn add_pending(&mut self, upload: ImageUpload) {
        self.pending_adds.push(upload);
    }

    /// Unqueue a pending binary by position. Out-of-range indexes are ignored.
    pub fn remove_pending(&mut self, index: usize) -> Option<ImageUpload> {
        (index < self.pending_adds.len()).then(|| self.pending_adds.remove(index))
    }

    /// Mark a kept image for removal by exact URL.
    pub fn remove_existing(&mut self, url: &str) -> bool {
        let before = self.kept.len();
        let (gone, kept): (Vec<_>, Vec<_>) =
            self.kept.drain(..).partition(|asset| asset.url() == url);
        self.kept = kept;
        self.removed.extend(gone);
        self.kept.len() != before
    }

    /// Whether the edit changes anything.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.pending_adds.is_empty() || !self.removed.is_empty()
    }

    /// Split into the kept images and the pending binaries.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Asset>, Vec<ImageUpload>) {
        (self.kept, self.pending_adds)
    }
}
