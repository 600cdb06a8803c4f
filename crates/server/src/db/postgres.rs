//! `PostgreSQL` record store.
//!
//! Every collection shares the `documents` table. `seq` is a `BIGSERIAL`
//! assigned on first insert, so upserts keep a document's position in
//! [`RecordStore::list`].

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::instrument;

use super::{Collection, Document, RecordStore, RepositoryError, StoredDocument};

/// Record store backed by the `documents` table.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_document(
    collection: Collection,
    id: &str,
    value: JsonValue,
) -> Result<Document, RepositoryError> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(RepositoryError::DataCorruption(format!(
            "{collection}/{id} is not an object: {other}"
        ))),
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    #[instrument(skip(self))]
    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        let data: Option<JsonValue> = sqlx::query_scalar(
            r"
            SELECT data FROM documents
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        data.map(|value| into_document(collection, id, value))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self, collection: Collection) -> Result<Vec<StoredDocument>, RepositoryError> {
        let rows: Vec<(String, JsonValue)> = sqlx::query_as(
            r"
            SELECT id, data FROM documents
            WHERE collection = $1
            ORDER BY seq
            ",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, value)| {
                let data = into_document(collection, &id, value)?;
                Ok(StoredDocument { id, data })
            })
            .collect()
    }

    #[instrument(skip(self, fields))]
    async fn put(
        &self,
        collection: Collection,
        id: Option<&str>,
        fields: Document,
    ) -> Result<String, RepositoryError> {
        let id = id.map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_owned);

        sqlx::query(
            r"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            ",
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(JsonValue::Object(fields))
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    #[instrument(skip(self, fields))]
    async fn patch(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = NOW()
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(JsonValue::Object(fields))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, fields))]
    async fn patch_existing(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE documents
            SET data = data || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(JsonValue::Object(fields))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_into_document_rejects_scalars() {
        let err = into_document(Collection::Products, "p1", JsonValue::from(3)).unwrap_err();
        assert!(err.to_string().contains("products/p1"));
    }
}
