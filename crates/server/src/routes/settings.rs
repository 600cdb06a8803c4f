//! Shop settings routes.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vitrine_core::{
    AppearanceForm, Asset, LogoShape, MultiAssetField, ShopSettings, SlidesForm, SocialForm,
    Theme,
};

use super::form::MultipartForm;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::services::{AppearanceOutcome, SlidesOutcome};
use crate::state::AppState;

/// Request to add a category.
#[derive(Debug, Deserialize)]
pub struct AddCategoryRequest {
    pub name: String,
}

/// Category list after a change.
#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// Current settings with defaults applied.
///
/// GET /api/settings
///
/// # Errors
///
/// Returns `AppError` if the store query fails.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<ShopSettings>, AppError> {
    Ok(Json(state.settings().get().await?))
}

/// Save the appearance tab.
///
/// POST /api/settings/appearance (multipart: `shopName?`, `theme?`,
/// `logoShape?`, `logoSize?`, `bannerHeight?`, `logo?`, `clearLogo?`,
/// `banner?`, `clearBanner?`)
///
/// # Errors
///
/// Returns 400 for invalid values. A failed logo or banner upload is reported
/// in `failedFields` with status 200.
#[instrument(skip(state, multipart))]
pub async fn update_appearance(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    multipart: Multipart,
) -> Result<Json<AppearanceOutcome>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let appearance = AppearanceForm {
        shop_name: form.text("shopName").map(str::to_owned),
        theme: form.parsed::<Theme>("theme")?,
        logo_shape: form.parsed::<LogoShape>("logoShape")?,
        logo_size: form.parsed::<u32>("logoSize")?,
        banner_height: form.parsed::<u32>("bannerHeight")?,
        logo: form.image_field("logo", "clearLogo"),
        banner: form.image_field("banner", "clearBanner"),
    };

    Ok(Json(state.settings().update_appearance(appearance).await?))
}

/// Save social links.
///
/// POST /api/settings/social (JSON: `facebookUrl?`, `tiktokUrl?`, `mapEmbedUrl?`)
///
/// # Errors
///
/// Returns 400 for a map iframe without `src`.
#[instrument(skip(state, form))]
pub async fn update_social(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(form): Json<SocialForm>,
) -> Result<Json<ShopSettings>, AppError> {
    Ok(Json(state.settings().update_social(form).await?))
}

/// Save the slide gallery.
///
/// POST /api/settings/slides (multipart: repeated `keep` URLs in display
/// order, repeated `slide` files appended after them)
///
/// # Errors
///
/// Returns `AppError` if the store write fails. Failed uploads are reported in
/// `failedUploads` with status 200.
#[instrument(skip(state, multipart))]
pub async fn update_slides(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    multipart: Multipart,
) -> Result<Json<SlidesOutcome>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let kept = form.texts("keep").map(Asset::new).collect();
    let slides = MultiAssetField::with_changes(kept, form.take_files("slide"));

    Ok(Json(
        state.settings().update_slides(SlidesForm { slides }).await?,
    ))
}

/// Add a category.
///
/// POST /api/settings/categories (JSON `{ "name": ... }`)
///
/// Blank or duplicate names return the list unchanged.
///
/// # Errors
///
/// Returns `AppError` if the store write fails.
#[instrument(skip(state))]
pub async fn add_category(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(request): Json<AddCategoryRequest>,
) -> Result<Json<CategoriesResponse>, AppError> {
    let categories = state.settings().add_category(&request.name).await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// Remove a category.
///
/// DELETE /api/settings/categories/{name}
///
/// # Errors
///
/// Returns 409 while products use the category, 404 if it is not listed.
#[instrument(skip(state))]
pub async fn remove_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    _admin: RequireAdmin,
) -> Result<Json<CategoriesResponse>, AppError> {
    let categories = state.settings().remove_category(&name).await?;
    Ok(Json(CategoriesResponse { categories }))
}
