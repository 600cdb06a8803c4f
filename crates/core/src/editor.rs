//! Admin editor state containers.
//!
//! Each editor is a small state machine driven by [`ProductEditorState::apply`]
//! or [`SettingsEditorState::apply`]. Nothing here performs I/O: a `Submit`
//! event yields a submission value for the service layer to execute, and
//! `Cancel` simply drops the pending edits.
//!
//! ```text
//! Closed --open--> Open --submit--> Submitting --completed--> Closed
//!                   ^  \--cancel--> Closed         |
//!                   +-------------failed-----------+
//! ```

use thiserror::Error;

use crate::types::{
    AppearanceForm, ImageUpload, LogoShape, MultiAssetField, Product, ProductDraft, ProductId,
    ShopSettings, SingleAssetField, SlidesForm, SocialForm, Theme,
};

/// Rejected editor transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditorError {
    /// The event needs an open editor.
    #[error("editor is not open")]
    NotOpen,
    /// An open event arrived while an editor is already open.
    #[error("editor is already open")]
    AlreadyOpen,
    /// Edits are frozen while a submit is in flight.
    #[error("a submit is in progress")]
    Busy,
    /// Completion events need an in-flight submit.
    #[error("no submit is in progress")]
    NotSubmitting,
    /// Categories are fixed once a product exists.
    #[error("category cannot be changed after creation")]
    CategoryLocked,
    /// Another editor owns the workspace.
    #[error("another editor is open")]
    OtherEditorOpen,
}

// =============================================================================
// Product editor
// =============================================================================

/// What a product editor session will write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    /// A new product; `category_context` is the category being browsed.
    Create { category_context: Option<String> },
    /// An existing product.
    Update(ProductId),
}

/// Form state of an open product editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductEditSession {
    pub target: EditTarget,
    pub draft: ProductDraft,
    pub image: SingleAssetField,
}

/// Lifecycle of the product editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProductEditorState {
    #[default]
    Closed,
    Open(ProductEditSession),
    Submitting(ProductEditSession),
}

/// Inputs to the product editor.
#[derive(Debug, Clone)]
pub enum ProductEditorEvent {
    OpenNew { category_context: Option<String> },
    OpenExisting(Product),
    SetName(String),
    SetDescription(String),
    SetCategory(String),
    AttachImage(ImageUpload),
    ClearImage,
    Submit,
    Cancel,
    Completed,
    Failed,
}

/// Work handed to the product service on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductSubmission {
    Create {
        draft: ProductDraft,
        image: Option<ImageUpload>,
        category_context: Option<String>,
    },
    Update {
        id: ProductId,
        draft: ProductDraft,
        image: SingleAssetField,
    },
}

impl ProductEditorState {
    /// Whether an editor session exists.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// The current form, if open.
    #[must_use]
    pub const fn session(&self) -> Option<&ProductEditSession> {
        match self {
            Self::Closed => None,
            Self::Open(session) | Self::Submitting(session) => Some(session),
        }
    }

    /// Advance the editor. A `Submit` returns the work to execute.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError`] when the event does not apply to the current state.
    pub fn apply(
        &mut self,
        event: ProductEditorEvent,
    ) -> Result<Option<ProductSubmission>, EditorError> {
        use ProductEditorEvent as E;

        match (std::mem::take(self), event) {
            (Self::Closed, E::OpenNew { category_context }) => {
                let draft = ProductDraft {
                    category: Some(
                        ProductDraft::default().resolve_category(category_context.as_deref()),
                    ),
                    ..ProductDraft::default()
                };
                *self = Self::Open(ProductEditSession {
                    target: EditTarget::Create { category_context },
                    draft,
                    image: SingleAssetField::Empty,
                });
                Ok(None)
            }
            (Self::Closed, E::OpenExisting(product)) => {
                let image = SingleAssetField::from_url(product.image_url.as_deref());
                *self = Self::Open(ProductEditSession {
                    draft: ProductDraft {
                        name: product.name,
                        description: product.description,
                        category: product.category,
                    },
                    target: EditTarget::Update(product.id),
                    image,
                });
                Ok(None)
            }
            (Self::Closed, _) => Err(EditorError::NotOpen),
            (state @ Self::Open(_), E::OpenNew { .. } | E::OpenExisting(_)) => {
                *self = state;
                Err(EditorError::AlreadyOpen)
            }
            (Self::Open(_), E::Cancel) => Ok(None),
            (Self::Open(session), E::Submit) => {
                let submission = match &session.target {
                    EditTarget::Create { category_context } => ProductSubmission::Create {
                        draft: session.draft.clone(),
                        image: match &session.image {
                            SingleAssetField::PendingReplace { upload, .. } => Some(upload.clone()),
                            _ => None,
                        },
                        category_context: category_context.clone(),
                    },
                    EditTarget::Update(id) => ProductSubmission::Update {
                        id: id.clone(),
                        draft: session.draft.clone(),
                        image: session.image.clone(),
                    },
                };
                *self = Self::Submitting(session);
                Ok(Some(submission))
            }
            (Self::Open(mut session), event) => {
                let result = session.edit(event);
                *self = Self::Open(session);
                result.map(|()| None)
            }
            (Self::Submitting(_), E::Completed) => Ok(None),
            (Self::Submitting(session), E::Failed) => {
                *self = Self::Open(session);
                Ok(None)
            }
            (state @ Self::Submitting(_), _) => {
                *self = state;
                Err(EditorError::Busy)
            }
        }
    }
}

impl ProductEditSession {
    fn edit(&mut self, event: ProductEditorEvent) -> Result<(), EditorError> {
        use ProductEditorEvent as E;

        match event {
            E::SetName(name) => self.draft.name = name,
            E::SetDescription(description) => self.draft.description = description,
            E::SetCategory(category) => {
                if matches!(self.target, EditTarget::Update(_)) {
                    return Err(EditorError::CategoryLocked);
                }
                self.draft.category = Some(category);
            }
            E::AttachImage(upload) => {
                self.image = std::mem::take(&mut self.image).replace_with(upload);
            }
            E::ClearImage => self.image = std::mem::take(&mut self.image).clear(),
            E::Completed | E::Failed => return Err(EditorError::NotSubmitting),
            E::OpenNew { .. } | E::OpenExisting(_) => return Err(EditorError::AlreadyOpen),
            E::Submit | E::Cancel => {}
        }
        Ok(())
    }
}

// =============================================================================
// Settings editor
// =============================================================================

/// Form state of an open settings editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsEditSession {
    pub shop_name: String,
    pub theme: Theme,
    pub logo_shape: LogoShape,
    pub logo_size: u32,
    pub banner_height: u32,
    pub logo: SingleAssetField,
    pub banner: SingleAssetField,
    pub facebook_url: String,
    pub tiktok_url: String,
    pub map_embed_url: String,
    pub slides: MultiAssetField,
}

impl From<&ShopSettings> for SettingsEditSession {
    fn from(settings: &ShopSettings) -> Self {
        Self {
            shop_name: settings.shop_name.clone(),
            theme: settings.theme,
            logo_shape: settings.logo_shape,
            logo_size: settings.logo_size,
            banner_height: settings.banner_height,
            logo: SingleAssetField::from_url(settings.logo_url.as_deref()),
            banner: SingleAssetField::from_url(settings.banner_url.as_deref()),
            facebook_url: settings.facebook_url.clone().unwrap_or_default(),
            tiktok_url: settings.tiktok_url.clone().unwrap_or_default(),
            map_embed_url: settings.map_embed_url.clone().unwrap_or_default(),
            slides: MultiAssetField::from_urls(settings.slide_urls.iter().cloned()),
        }
    }
}

/// Lifecycle of the settings editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SettingsEditorState {
    #[default]
    Closed,
    Open(SettingsEditSession),
    Submitting(SettingsEditSession),
}

/// Inputs to the settings editor.
#[derive(Debug, Clone)]
pub enum SettingsEditorEvent {
    Open(ShopSettings),
    SetShopName(String),
    SetTheme(Theme),
    SetLogoShape(LogoShape),
    SetLogoSize(u32),
    SetBannerHeight(u32),
    AttachLogo(ImageUpload),
    ClearLogo,
    AttachBanner(ImageUpload),
    ClearBanner,
    SetFacebookUrl(String),
    SetTiktokUrl(String),
    SetMapEmbedUrl(String),
    AddSlide(ImageUpload),
    RemoveSlide(String),
    RemovePendingSlide(usize),
    Submit,
    Cancel,
    Completed,
    Failed,
}

/// Work handed to the settings service on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSubmission {
    pub appearance: AppearanceForm,
    pub social: SocialForm,
    pub slides: SlidesForm,
}

impl SettingsEditorState {
    /// Whether an editor session exists.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// The current form, if open.
    #[must_use]
    pub const fn session(&self) -> Option<&SettingsEditSession> {
        match self {
            Self::Closed => None,
            Self::Open(session) | Self::Submitting(session) => Some(session),
        }
    }

    /// Advance the editor. A `Submit` returns the work to execute.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError`] when the event does not apply to the current state.
    pub fn apply(
        &mut self,
        event: SettingsEditorEvent,
    ) -> Result<Option<SettingsSubmission>, EditorError> {
        use SettingsEditorEvent as E;

        match (std::mem::take(self), event) {
            (Self::Closed, E::Open(settings)) => {
                *self = Self::Open(SettingsEditSession::from(&settings));
                Ok(None)
            }
            (Self::Closed, _) => Err(EditorError::NotOpen),
            (state @ Self::Open(_), E::Open(_)) => {
                *self = state;
                Err(EditorError::AlreadyOpen)
            }
            (Self::Open(_), E::Cancel) => Ok(None),
            (Self::Open(session), E::Submit) => {
                let submission = session.to_submission();
                *self = Self::Submitting(session);
                Ok(Some(submission))
            }
            (Self::Open(mut session), event) => {
                let result = session.edit(event);
                *self = Self::Open(session);
                result.map(|()| None)
            }
            (Self::Submitting(_), E::Completed) => Ok(None),
            (Self::Submitting(session), E::Failed) => {
                *self = Self::Open(session);
                Ok(None)
            }
            (state @ Self::Submitting(_), _) => {
                *self = state;
                Err(EditorError::Busy)
            }
        }
    }
}

impl SettingsEditSession {
    fn edit(&mut self, event: SettingsEditorEvent) -> Result<(), EditorError> {
        use SettingsEditorEvent as E;

        match event {
            E::SetShopName(v) => self.shop_name = v,
            E::SetTheme(v) => self.theme = v,
            E::SetLogoShape(v) => self.logo_shape = v,
            E::SetLogoSize(v) => self.logo_size = v,
            E::SetBannerHeight(v) => self.banner_height = v,
            E::AttachLogo(upload) => {
                self.logo = std::mem::take(&mut self.logo).replace_with(upload);
            }
            E::ClearLogo => self.logo = std::mem::take(&mut self.logo).clear(),
            E::AttachBanner(upload) => {
                self.banner = std::mem::take(&mut self.banner).replace_with(upload);
            }
            E::ClearBanner => self.banner = std::mem::take(&mut self.banner).clear(),
            E::SetFacebookUrl(v) => self.facebook_url = v,
            E::SetTiktokUrl(v) => self.tiktok_url = v,
            E::SetMapEmbedUrl(v) => self.map_embed_url = v,
            E::AddSlide(upload) => self.slides.add_pending(upload),
            E::RemoveSlide(url) => {
                self.slides.remove_existing(&url);
            }
            E::RemovePendingSlide(index) => {
                self.slides.remove_pending(index);
            }
            E::Completed | E::Failed => return Err(EditorError::NotSubmitting),
            E::Open(_) => return Err(EditorError::AlreadyOpen),
            E::Submit | E::Cancel => {}
        }
        Ok(())
    }

    fn to_submission(&self) -> SettingsSubmission {
        // A pending clear is submitted as Empty; the service deletes against
        // the stored record, not the client's copy.
        let image = |field: &SingleAssetField| match field {
            SingleAssetField::PendingClear(_) => SingleAssetField::Empty,
            other => other.clone(),
        };

        SettingsSubmission {
            appearance: AppearanceForm {
                shop_name: Some(self.shop_name.clone()),
                theme: Some(self.theme),
                logo_shape: Some(self.logo_shape),
                logo_size: Some(self.logo_size),
                banner_height: Some(self.banner_height),
                logo: Some(image(&self.logo)),
                banner: Some(image(&self.banner)),
            },
            social: SocialForm {
                facebook_url: Some(self.facebook_url.clone()),
                tiktok_url: Some(self.tiktok_url.clone()),
                map_embed_url: Some(self.map_embed_url.clone()),
            },
            slides: SlidesForm {
                slides: self.slides.clone(),
            },
        }
    }
}

// =============================================================================
// Workspace
// =============================================================================

/// The editor currently owning the admin workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveEditor {
    Product(ProductEditorState),
    Settings(SettingsEditorState),
}

/// Holds at most one open editor, so product and settings forms never
/// overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminWorkspace {
    active: Option<ActiveEditor>,
}

impl AdminWorkspace {
    /// Create an empty workspace.
    #[must_use]
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// The open editor, if any.
    #[must_use]
    pub const fn active(&self) -> Option<&ActiveEditor> {
        self.active.as_ref()
    }

    /// Route an event to the product editor.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::OtherEditorOpen`] while the settings editor is open,
    /// or any error of [`ProductEditorState::apply`].
    pub fn product(
        &mut self,
        event: ProductEditorEvent,
    ) -> Result<Option<ProductSubmission>, EditorError> {
        let mut state = match self.active.take() {
            None => ProductEditorState::Closed,
            Some(ActiveEditor::Product(state)) => state,
            Some(other @ ActiveEditor::Settings(_)) => {
                self.active = Some(other);
                return Err(EditorError::OtherEditorOpen);
            }
        };
        let result = state.apply(event);
        self.active = state.is_open().then_some(ActiveEditor::Product(state));
        result
    }

    /// Route an event to the settings editor.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::OtherEditorOpen`] while the product editor is open,
    /// or any error of [`SettingsEditorState::apply`].
    pub fn settings(
        &mut self,
        event: SettingsEditorEvent,
    ) -> Result<Option<SettingsSubmission>, EditorError> {
        let mut state = match self.active.take() {
            None => SettingsEditorState::Closed,
            Some(ActiveEditor::Settings(state)) => state,
            Some(other @ ActiveEditor::Product(_)) => {
                self.active = Some(other);
                return Err(EditorError::OtherEditorOpen);
            }
        };
        let result = state.apply(event);
        self.active = state.is_open().then_some(ActiveEditor::Settings(state));
        result
    }
}
