//! Document persistence.
//!
//! Records are schemaless JSON documents addressed by `(collection, id)`,
//! stored through the [`RecordStore`] trait. Two stores exist:
//!
//! - [`PgRecordStore`] - `PostgreSQL` `documents` table with a JSONB payload
//! - [`MemoryRecordStore`] - process-local store for tests and local runs
//!
//! Typed access goes through the repositories in [`products`] and [`settings`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p vitrine-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;
pub mod products;
pub mod settings;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;
pub use products::ProductRepository;
pub use settings::SettingsRepository;

/// Top-level fields of a stored document.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A value could not be converted to or from its document form.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Settings,
}

impl Collection {
    /// Name used as the `collection` column value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Settings => "settings",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Opaque document database.
///
/// Writes are last-write-wins; there is no concurrency token.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one document.
    async fn get(&self, collection: Collection, id: &str)
    -> Result<Option<Document>, RepositoryError>;

    /// All documents of a collection in insertion order.
    async fn list(&self, collection: Collection) -> Result<Vec<StoredDocument>, RepositoryError>;

    /// Write a whole document. A missing `id` is assigned by the store.
    /// Returns the document id.
    async fn put(
        &self,
        collection: Collection,
        id: Option<&str>,
        fields: Document,
    ) -> Result<String, RepositoryError>;

    /// Merge `fields` into the top level of a document, creating it if absent.
    async fn patch(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), RepositoryError>;

    /// Merge `fields` into the top level of an existing document.
    ///
    /// Returns `RepositoryError::NotFound` when the document is absent;
    /// nothing is created.
    async fn patch_existing(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), RepositoryError>;

    /// Remove a document. Removing an absent document is not an error.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Serialize a value into document fields.
///
/// # Errors
///
/// Returns `RepositoryError::Serialization` if serialization fails, or
/// `RepositoryError::DataCorruption` if the value is not a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, RepositoryError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(RepositoryError::DataCorruption(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
