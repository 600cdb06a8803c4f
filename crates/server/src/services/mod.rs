//! Business logic services.
//!
//! # Services
//!
//! - `reconcile` - Upload/delete orchestration for image fields
//! - `products` - Product create, update and delete
//! - `settings` - Appearance, social links, slides and categories

pub mod products;
pub mod reconcile;
pub mod settings;

use thiserror::Error;

use crate::db::RepositoryError;
use crate::media::AssetError;

pub use products::{CreateProduct, ProductService, UpdateProduct};
pub use reconcile::{AssetReconciler, Reconciled, SideEffect, Staged};
pub use settings::{AppearanceOutcome, SettingsSaveOutcome, SettingsService, SlidesOutcome};

/// Errors surfaced by the editor services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The submitted form is incomplete or invalid. Nothing was changed.
    #[error("{0}")]
    Validation(String),

    /// The addressed entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A category cannot be removed while products reference it.
    #[error("category '{name}' is used by {products} product(s)")]
    CategoryInUse { name: String, products: usize },

    /// A must-succeed media operation failed. Nothing was persisted.
    #[error("asset operation failed: {0}")]
    AssetOperationFailed(#[from] AssetError),

    /// The record store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
