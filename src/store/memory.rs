//! In-process document store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError};

/// Insertion-ordered collection held in memory.
///
/// Mirrors the database's behavior of assigning an object id to documents
/// that arrive without `_id` and of keeping `_id` unique: a batch whose ids
/// collide with stored documents or with each other is rejected with
/// [`StoreError::DuplicateKey`] and nothing is inserted. After
/// [`DocumentStore::shutdown`] every operation fails with
/// [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<Document>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable(
                "memory store has been shut down".to_string(),
            ));
        }
        Ok(())
    }
}

/// Identity key for an `_id`; includes the BSON type so `7` and `"7"` differ.
fn id_key(id: &Bson) -> String {
    format!("{:?}", id)
}

fn with_generated_id(doc: Document) -> Document {
    // Keep _id first, as the database does
    let mut with_id = Document::new();
    with_id.insert("_id", ObjectId::new());
    for (key, value) in doc {
        with_id.insert(key, value);
    }
    with_id
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_many(&self, documents: Vec<Document>) -> Result<u64, StoreError> {
        self.ensure_open()?;
        let documents: Vec<Document> = documents
            .into_iter()
            .map(|doc| {
                if doc.contains_key("_id") {
                    doc
                } else {
                    with_generated_id(doc)
                }
            })
            .collect();

        let mut stored = self.documents.write().await;
        let mut seen: HashSet<String> = stored
            .iter()
            .filter_map(|doc| doc.get("_id"))
            .map(id_key)
            .collect();
        for doc in &documents {
            if let Some(id) = doc.get("_id") {
                if !seen.insert(id_key(id)) {
                    return Err(StoreError::DuplicateKey(id.to_string()));
                }
            }
        }

        let inserted = documents.len() as u64;
        stored.extend(documents);
        Ok(inserted)
    }

    async fn find_all(&self) -> Result<Vec<Document>, StoreError> {
        self.ensure_open()?;
        Ok(self.documents.read().await.clone())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.ensure_open()?;
        Ok(self.documents.read().await.len() as u64)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        self.ensure_open()?;
        let mut stored = self.documents.write().await;
        let removed = stored.len() as u64;
        stored.clear();
        Ok(removed)
    }

    async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, Bson};

    #[tokio::test]
    async fn assigns_object_ids_to_new_documents() {
        let store = MemoryStore::new();
        let inserted = store
            .insert_many(vec![doc! { "name": "a" }, doc! { "name": "b" }])
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let docs = store.find_all().await.unwrap();
        assert_eq!(docs.len(), 2);
        for doc in &docs {
            assert!(matches!(doc.get("_id"), Some(Bson::ObjectId(_))));
            assert_eq!(doc.keys().next().map(String::as_str), Some("_id"));
        }
        assert_ne!(docs[0].get("_id"), docs[1].get("_id"));
        assert_eq!(docs[0].get_str("name").unwrap(), "a");
        assert_eq!(docs[1].get_str("name").unwrap(), "b");
    }

    #[tokio::test]
    async fn keeps_caller_supplied_ids() {
        let store = MemoryStore::new();
        store
            .insert_many(vec![doc! { "_id": 7, "name": "seven" }])
            .await
            .unwrap();
        let docs = store.find_all().await.unwrap();
        assert_eq!(docs[0].get("_id"), Some(&Bson::Int32(7)));
    }

    #[tokio::test]
    async fn rejects_id_already_stored() {
        let store = MemoryStore::new();
        store.insert_many(vec![doc! { "_id": 7 }]).await.unwrap();

        let err = store.insert_many(vec![doc! { "_id": 7 }]).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_colliding_ids_within_a_batch_atomically() {
        let store = MemoryStore::new();
        let err = store
            .insert_many(vec![
                doc! { "_id": "a", "n": 1 },
                doc! { "name": "fresh" },
                doc! { "_id": "a", "n": 2 },
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ids_of_different_types_do_not_collide() {
        let store = MemoryStore::new();
        let inserted = store
            .insert_many(vec![doc! { "_id": 7 }, doc! { "_id": "7" }])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
    }

    #[tokio::test]
    async fn clear_reports_removed_count() {
        let store = MemoryStore::new();
        store
            .insert_many(vec![doc! { "x": 1 }, doc! { "x": 2 }, doc! { "x": 3 }])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(store.clear().await.unwrap(), 3);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn operations_fail_after_shutdown() {
        let store = MemoryStore::new();
        store.shutdown().await;
        assert!(matches!(
            store.find_all().await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.insert_many(vec![doc! { "x": 1 }]).await.is_err());
    }
}
