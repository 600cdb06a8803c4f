//! Raw media host endpoints for tooling.
//!
//! These bypass the editors: nothing is persisted and no reconciliation runs.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::form::MultipartForm;
use crate::error::AppError;
use crate::media::{AssetRef, DeleteOutcome, StoredAsset};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Delete target: a store id, or a delivery URL to derive one from.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAssetRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
}

/// Delete result, `ok` or `not found`.
#[derive(Debug, Serialize)]
pub struct DeleteAssetResponse {
    pub result: &'static str,
}

/// Upload one image.
///
/// POST /api/upload (multipart: `file`, `folder?`)
///
/// # Errors
///
/// Returns 400 without a file, 502 if the media host rejects the upload.
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    multipart: Multipart,
) -> Result<Json<StoredAsset>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_owned()))?;
    let folder = form
        .non_blank("folder")
        .unwrap_or(state.config().upload_folder.as_str());

    let stored = state.assets().upload(&file, folder).await?;
    info!(public_id = %stored.store_id, "Asset uploaded");
    Ok(Json(stored))
}

/// Delete one image by store id or URL.
///
/// DELETE /api/upload (JSON: `url?`, `publicId?`)
///
/// Deleting an absent asset succeeds with `not found`.
///
/// # Errors
///
/// Returns 400 when neither field yields a store id.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(request): Json<DeleteAssetRequest>,
) -> Result<Json<DeleteAssetResponse>, AppError> {
    let target = match (request.public_id, request.url) {
        (Some(id), _) if !id.trim().is_empty() => AssetRef::StoreId(id.trim().to_owned()),
        (_, Some(url)) if !url.trim().is_empty() => AssetRef::Url(url.trim().to_owned()),
        _ => return Err(AppError::BadRequest("Invalid URL or publicId".to_owned())),
    };

    let result = match state.assets().delete(&target).await? {
        DeleteOutcome::Deleted => "ok",
        DeleteOutcome::AlreadyAbsent => "not found",
    };
    info!(asset = %target, result, "Asset delete requested");
    Ok(Json(DeleteAssetResponse { result }))
}
