//! Product catalog routes.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use tracing::instrument;

use vitrine_core::{Product, ProductDraft, ProductId};

use super::form::MultipartForm;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::services::{CreateProduct, UpdateProduct};
use crate::state::AppState;

/// List all products in insertion order.
///
/// GET /api/products
///
/// # Errors
///
/// Returns `AppError` if the store query fails.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.products().list().await?))
}

/// Create a product.
///
/// POST /api/products (multipart: `name`, `description`, `category?`,
/// `categoryContext?`, `image?`)
///
/// # Errors
///
/// Returns 400 for missing fields, 502 if the image upload fails.
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let request = CreateProduct {
        draft: draft(&form),
        image: form.take_file("image"),
        category_context: form.non_blank("categoryContext").map(str::to_owned),
    };

    let product = state.products().create(request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product.
///
/// PUT /api/products/{id} (multipart: `name`, `description`, `category?`,
/// `image?`, `clearImage?`)
///
/// Without `image` or `clearImage` the current image is kept.
///
/// # Errors
///
/// Returns 400 for invalid fields, 404 for an unknown id, 502 if the
/// replacement upload fails.
#[instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _admin: RequireAdmin,
    multipart: Multipart,
) -> Result<Json<Product>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;

    let request = UpdateProduct {
        draft: draft(&form),
        image: form.image_field("image", "clearImage"),
    };

    let product = state
        .products()
        .update(&ProductId::new(id), request)
        .await?;
    Ok(Json(product))
}

/// Delete a product and its image.
///
/// DELETE /api/products/{id}
///
/// # Errors
///
/// Returns 404 for an unknown id.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    _admin: RequireAdmin,
) -> Result<StatusCode, AppError> {
    state.products().delete(&ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn draft(form: &MultipartForm) -> ProductDraft {
    ProductDraft {
        name: form.text("name").unwrap_or_default().to_owned(),
        description: form.text("description").unwrap_or_default().to_owned(),
        category: form.non_blank("category").map(str::to_owned),
    }
}
