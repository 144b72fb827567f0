//! Document store abstraction.
//!
//! The collection of loaded records lives behind [`DocumentStore`] so the
//! bootstrap step and the HTTP handlers receive an explicitly constructed
//! handle instead of reaching for process-wide state. Two backends exist:
//! - [`MongoStore`]: a MongoDB collection (production)
//! - [`MemoryStore`]: an in-process, insertion-ordered collection (development and tests)

mod memory;
mod mongo;

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::config::{DatabaseConfig, StoreBackend};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Errors surfaced by a document store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate _id: {0}")]
    DuplicateKey(String),
}

/// A single schemaless collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert every document in one batch call. Documents without an `_id`
    /// receive a generated one. An `_id` that is already stored, or repeated
    /// within the batch, is an error. Returns the number inserted.
    async fn insert_many(&self, documents: Vec<Document>) -> Result<u64, StoreError>;

    /// Unfiltered scan in the backend's natural order.
    async fn find_all(&self) -> Result<Vec<Document>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Delete every document, returning how many were removed.
    async fn clear(&self) -> Result<u64, StoreError>;

    /// Release connections held by the store.
    async fn shutdown(&self) {}

    /// Short backend name for logging.
    fn backend_name(&self) -> &'static str;
}

/// Shared handle passed to the bootstrap step and the router state.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Build the configured backend. For MongoDB this connects and verifies the
/// server is reachable, so an unreachable database fails startup here.
pub async fn connect(config: &DatabaseConfig) -> Result<SharedStore, StoreError> {
    match config.backend {
        StoreBackend::Mongodb => Ok(Arc::new(MongoStore::connect(config).await?)),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store - loaded records are not persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
