//! In-process record store.
//!
//! Keeps documents per collection in insertion order and counts every call,
//! so tests can assert that a code path never touched persistence. Writes can
//! be switched to fail to exercise rollback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Collection, Document, RecordStore, RepositoryError, StoredDocument};

/// Record store held in memory.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    collections: RwLock<HashMap<Collection, Vec<StoredDocument>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    failing_writes: AtomicBool,
}

impl MemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get`/`list` calls so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `put`/`patch`/`delete` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every following write fail (or succeed again).
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Count a write and reject it while writes are failing.
    fn begin_write(&self) -> Result<(), RepositoryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    /// Total calls of any kind, excluding `ping`.
    #[must_use]
    pub fn operations(&self) -> usize {
        self.reads() + self.writes()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .map(|d| d.data.clone()))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<StoredDocument>, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn put(
        &self,
        collection: Collection,
        id: Option<&str>,
        fields: Document,
    ) -> Result<String, RepositoryError> {
        self.begin_write()?;
        let id = id.map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_owned);

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(existing) => existing.data = fields,
            None => docs.push(StoredDocument {
                id: id.clone(),
                data: fields,
            }),
        }
        Ok(id)
    }

    async fn patch(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), RepositoryError> {
        self.begin_write()?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(existing) => existing.data.extend(fields),
            None => docs.push(StoredDocument {
                id: id.to_owned(),
                data: fields,
            }),
        }
        Ok(())
    }

    async fn patch_existing(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), RepositoryError> {
        self.begin_write()?;

        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or(RepositoryError::NotFound)?;
        existing.data.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RepositoryError> {
        self.begin_write()?;

        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(&collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_put_assigns_id_and_list_keeps_insertion_order() {
        let store = MemoryRecordStore::new();
        let a = store
            .put(Collection::Products, None, doc(json!({"name": "a"})))
            .await
            .unwrap();
        store
            .put(Collection::Products, Some("b"), doc(json!({"name": "b"})))
            .await
            .unwrap();
        // Overwriting keeps the position.
        store
            .put(Collection::Products, Some(&a), doc(json!({"name": "a2"})))
            .await
            .unwrap();

        let listed = store.list(Collection::Products).await.unwrap();
        let names: Vec<_> = listed.iter().map(|d| d.data["name"].clone()).collect();
        assert_eq!(names, [json!("a2"), json!("b")]);
        assert_eq!(a.len(), 36);
    }

    #[tokio::test]
    async fn test_patch_merges_top_level_and_creates() {
        let store = MemoryRecordStore::new();
        store
            .patch(Collection::Settings, "general", doc(json!({"shopName": "S", "logoSize": 80})))
            .await
            .unwrap();
        store
            .patch(Collection::Settings, "general", doc(json!({"logoSize": 120})))
            .await
            .unwrap();

        let got = store.get(Collection::Settings, "general").await.unwrap().unwrap();
        assert_eq!(got["shopName"], json!("S"));
        assert_eq!(got["logoSize"], json!(120));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_and_counted() {
        let store = MemoryRecordStore::new();
        store.delete(Collection::Products, "nope").await.unwrap();
        store.delete(Collection::Products, "nope").await.unwrap();
        assert_eq!(store.writes(), 2);
        assert_eq!(store.reads(), 0);
        assert!(store.get(Collection::Products, "nope").await.unwrap().is_none());
        assert_eq!(store.operations(), 3);
    }

    #[tokio::test]
    async fn test_patch_existing_never_creates() {
        let store = MemoryRecordStore::new();
        let missing = store
            .patch_existing(Collection::Products, "gone", doc(json!({"name": "x"})))
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound)));
        assert!(store.get(Collection::Products, "gone").await.unwrap().is_none());

        store
            .put(Collection::Products, Some("p"), doc(json!({"name": "a", "category": "Art"})))
            .await
            .unwrap();
        store
            .patch_existing(Collection::Products, "p", doc(json!({"name": "b"})))
            .await
            .unwrap();
        let got = store.get(Collection::Products, "p").await.unwrap().unwrap();
        assert_eq!(got["name"], json!("b"));
        assert_eq!(got["category"], json!("Art"));
    }

    #[tokio::test]
    async fn test_failing_writes_leave_documents_untouched() {
        let store = MemoryRecordStore::new();
        store
            .put(Collection::Settings, Some("general"), doc(json!({"shopName": "S"})))
            .await
            .unwrap();

        store.set_failing_writes(true);
        let result = store
            .patch(Collection::Settings, "general", doc(json!({"shopName": "T"})))
            .await;
        assert!(matches!(result, Err(RepositoryError::Database(_))));
        assert!(store.delete(Collection::Settings, "general").await.is_err());

        store.set_failing_writes(false);
        let got = store.get(Collection::Settings, "general").await.unwrap().unwrap();
        assert_eq!(got["shopName"], json!("S"));
    }
}
