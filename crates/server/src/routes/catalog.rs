//! Storefront catalog view.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vitrine_core::Product;
use vitrine_core::catalog::{self, CategorySummary};

use crate::error::AppError;
use crate::middleware::OptionalAdmin;
use crate::state::AppState;

/// Query parameters for the catalog.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

/// Either the category overview or the products of one category.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CatalogView {
    Categories {
        categories: Vec<CategorySummary>,
    },
    Category {
        category: String,
        products: Vec<Product>,
    },
}

/// Catalog overview or one category.
///
/// GET /api/catalog?category=
///
/// Shoppers only see categories that have products; admins see all of them.
///
/// # Errors
///
/// Returns `AppError` if a store query fails.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAdmin(is_admin): OptionalAdmin,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogView>, AppError> {
    let products = state.products().list().await?;

    if let Some(category) = query.category.filter(|c| !c.trim().is_empty()) {
        let products = catalog::products_in(&products, &category)
            .into_iter()
            .cloned()
            .collect();
        return Ok(Json(CatalogView::Category { category, products }));
    }

    let settings = state.settings().get().await?;
    Ok(Json(CatalogView::Categories {
        categories: catalog::summarize(&settings.categories, &products, is_admin),
    }))
}
