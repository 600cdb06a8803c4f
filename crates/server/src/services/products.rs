//! Product editor operations.
//!
//! Each write follows the same order: validate, stage image uploads, write the
//! record, then delete whatever image lost its owner. A failed record write
//! removes the fresh upload and leaves the old image in place.

use chrono::Utc;
use tracing::{info, instrument};

use vitrine_core::editor::ProductSubmission;
use vitrine_core::{ImageUpload, Product, ProductDraft, ProductId, SingleAssetField};

use super::ServiceError;
use super::reconcile::AssetReconciler;
use crate::db::products::{NewProduct, ProductUpdate};
use crate::db::{ProductRepository, RecordStore, RepositoryError};
use crate::media::AssetStore;

/// A new product submission.
#[derive(Debug, Clone, Default)]
pub struct CreateProduct {
    pub draft: ProductDraft,
    pub image: Option<ImageUpload>,
    /// Category being browsed when the editor was opened.
    pub category_context: Option<String>,
}

/// An edit of an existing product.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub draft: ProductDraft,
    /// `None` leaves the image untouched.
    pub image: Option<SingleAssetField>,
}

/// Product create/update/delete against the record and asset stores.
pub struct ProductService<'a> {
    records: &'a dyn RecordStore,
    assets: &'a dyn AssetStore,
    folder: &'a str,
}

impl<'a> ProductService<'a> {
    /// Create a product service uploading images into `folder`.
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

    const fn repo(&self) -> ProductRepository<'a> {
        ProductRepository::new(self.records)
    }

    const fn reconciler(&self) -> AssetReconciler<'a> {
        AssetReconciler::new(self.assets, self.folder)
    }

    /// All products in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store query fails.
    pub async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.repo().list().await?)
    }

    /// Create a product, uploading its image first.
    ///
    /// # Errors
    ///
    /// - `Validation` if name or description is blank (no side effects).
    /// - `AssetOperationFailed` if the image upload fails (nothing persisted).
    /// - `Repository` if the record write fails (the upload is removed again).
    #[instrument(skip(self, request), fields(name = %request.draft.name))]
    pub async fn create(&self, request: CreateProduct) -> Result<Product, ServiceError> {
        validate(&request.draft)?;

        let category = request
            .draft
            .resolve_category(request.category_context.as_deref());
        let field = request
            .image
            .map_or(SingleAssetField::Empty, |upload| {
                SingleAssetField::Empty.replace_with(upload)
            });

        let reconciler = self.reconciler();
        let staged = reconciler.stage_single(None, field).await?;

        let new_product = NewProduct {
            name: request.draft.name.trim().to_owned(),
            description: request.draft.description.trim().to_owned(),
            category,
            image_url: staged.value.clone(),
            created_at: Utc::now(),
        };

        match self.repo().insert(new_product).await {
            Ok(product) => {
                reconciler.commit(staged).await;
                info!(product_id = %product.id, "Product created");
                Ok(product)
            }
            Err(e) => {
                reconciler.abandon(staged).await;
                Err(e.into())
            }
        }
    }

    /// Update a product's text fields and image.
    ///
    /// The previous image is read from the stored record. The category cannot
    /// change; sending the current category (or none) is accepted.
    ///
    /// # Errors
    ///
    /// - `Validation` for blank fields or a category change.
    /// - `NotFound` if the product does not exist.
    /// - `AssetOperationFailed` if a replacement upload fails (record and old
    ///   image untouched).
    #[instrument(skip(self, request), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: &ProductId,
        request: UpdateProduct,
    ) -> Result<Product, ServiceError> {
        validate(&request.draft)?;

        let repo = self.repo();
        let existing = repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))?;

        if let Some(category) = request
            .draft
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            && category != existing.effective_category()
        {
            return Err(ServiceError::Validation(
                "category cannot be changed after creation".to_owned(),
            ));
        }

        let previous = existing.image();
        let field = request
            .image
            .unwrap_or_else(|| SingleAssetField::from_url(existing.image_url.as_deref()));

        let reconciler = self.reconciler();
        let staged = reconciler.stage_single(previous.as_ref(), field).await?;

        let update = ProductUpdate {
            name: request.draft.name.trim().to_owned(),
            description: request.draft.description.trim().to_owned(),
            image_url: staged.value.clone().unwrap_or_default(),
            updated_at: Utc::now(),
        };

        match repo.update(id, &update).await {
            Ok(product) => {
                reconciler.commit(staged).await;
                info!("Product updated");
                Ok(product)
            }
            Err(e) => {
                reconciler.abandon(staged).await;
                Err(match e {
                    RepositoryError::NotFound => ServiceError::NotFound(format!("product {id}")),
                    other => other.into(),
                })
            }
        }
    }

    /// Delete a product and release its image.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the product does not exist.
    /// - `Repository` if the record delete fails (the image is kept).
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), ServiceError> {
        let repo = self.repo();
        let existing = repo
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))?;

        repo.delete(id).await?;

        let reconciler = self.reconciler();
        let staged = reconciler
            .stage_single(existing.image().as_ref(), SingleAssetField::Empty)
            .await?;
        reconciler.commit(staged).await;

        info!("Product deleted");
        Ok(())
    }

    /// Execute a submission produced by the product editor.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`] and [`Self::update`].
    pub async fn submit(&self, submission: ProductSubmission) -> Result<Product, ServiceError> {
        match submission {
            ProductSubmission::Create {
                draft,
                image,
                category_context,
            } => {
                self.create(CreateProduct {
                    draft,
                    image,
                    category_context,
                })
                .await
            }
            ProductSubmission::Update { id, draft, image } => {
                self.update(
                    &id,
                    UpdateProduct {
                        draft,
                        image: Some(image),
                    },
                )
                .await
            }
        }
    }
}

fn validate(draft: &ProductDraft) -> Result<(), ServiceError> {
    let missing = draft.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}
