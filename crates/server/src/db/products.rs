//! Product repository over the `products` collection.
//!
//! Stored documents do not carry their own id; it is the document key.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use vitrine_core::{Product, ProductId};

use super::{Collection, Document, RecordStore, RepositoryError, to_document};

/// Fields written when a product is created.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields written when a product is edited. Category is fixed at creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    /// `""` clears the image.
    pub image_url: String,
    pub updated_at: DateTime<Utc>,
}

/// Repository for product documents.
pub struct ProductRepository<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// List all products in insertion order.
    ///
    /// Documents that cannot be read as a product are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let docs = self.store.list(Collection::Products).await?;

        Ok(docs
            .into_iter()
            .filter_map(|doc| match decode(&doc.id, doc.data) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(product_id = %doc.id, error = %e, "Skipping unreadable product document");
                    None
                }
            })
            .collect())
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored document is not a product.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.store
            .get(Collection::Products, id.as_str())
            .await?
            .map(|data| decode(id.as_str(), data))
            .transpose()
    }

    /// Insert a new product with a store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    pub async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut fields = to_document(&product)?;
        // Absent image is stored as an empty string like the rest of the catalog.
        if fields.get("imageUrl").is_some_and(serde_json::Value::is_null) {
            fields.insert("imageUrl".to_owned(), serde_json::Value::String(String::new()));
        }

        let id = self.store.put(Collection::Products, None, fields).await?;

        Ok(Product {
            id: ProductId::new(id),
            name: product.name,
            description: product.description,
            category: Some(product.category),
            image_url: product.image_url,
            created_at: Some(product.created_at),
            updated_at: None,
        })
    }

    /// Merge edited fields into an existing product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product no longer exists.
    pub async fn update(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        self.store
            .patch_existing(Collection::Products, id.as_str(), to_document(update)?)
            .await?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the delete fails.
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        self.store.delete(Collection::Products, id.as_str()).await
    }
}

fn decode(id: &str, mut data: Document) -> Result<Product, RepositoryError> {
    data.insert("id".to_owned(), serde_json::Value::String(id.to_owned()));
    serde_json::from_value(serde_json::Value::Object(data))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid product {id}: {e}")))
}
