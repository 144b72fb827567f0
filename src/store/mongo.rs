//! MongoDB-backed document store.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};

use super::{DocumentStore, StoreError};
use crate::config::{DatabaseConfig, DEFAULT_DATABASE_NAME};

/// Application name reported to the server in the connection handshake
const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// One MongoDB collection, reached through a pooled client.
///
/// `Client` is internally reference counted, so the store is cheap to share.
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connect using the configured URI and ping the database.
    ///
    /// The driver connects lazily, so the ping is what turns an unreachable
    /// server into a startup error (after `server_selection_timeout_seconds`).
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.server_selection_timeout =
            Some(Duration::from_secs(config.server_selection_timeout_seconds));
        options.app_name = Some(APP_NAME.to_string());

        let database_name = resolve_database_name(config, options.default_database.as_deref());
        let client = Client::with_options(options)?;
        let database = client.database(&database_name);

        database.run_command(doc! { "ping": 1 }).await?;

        tracing::info!(
            database = %database_name,
            collection = %config.collection,
            "Connected to MongoDB"
        );

        Ok(Self {
            collection: database.collection(&config.collection),
            client,
        })
    }
}

/// Explicit config name, else the URI's default database, else the built-in default.
fn resolve_database_name(config: &DatabaseConfig, uri_default: Option<&str>) -> String {
    config
        .name
        .as_deref()
        .or(uri_default)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DATABASE_NAME)
        .to_string()
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_many(&self, documents: Vec<Document>) -> Result<u64, StoreError> {
        let result = self.collection.insert_many(documents).await?;
        Ok(result.inserted_ids.len() as u64)
    }

    async fn find_all(&self) -> Result<Vec<Document>, StoreError> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect::<Vec<Document>>().await?)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let result = self.collection.delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }

    async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        tracing::debug!("MongoDB client shut down");
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}
