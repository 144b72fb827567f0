//! Handler returning every loaded record.
//!
//! The whole collection is read and returned on each call; there is no
//! filtering or pagination.

use axum::{extract::State, Json};
use serde_json::Value;
use tracing::instrument;

use crate::error::AppError;
use crate::record::document_to_json;
use crate::state::AppState;

/// `GET /api/jsondata`: all records as a JSON array, each `_id` rendered as a string.
#[instrument(name = "jsondata::list", skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Value>>, AppError> {
    let documents = state.store.find_all().await?;
    tracing::debug!(records = documents.len(), "Fetched records");

    Ok(Json(documents.into_iter().map(document_to_json).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore};
    use axum::response::IntoResponse;
    use http::StatusCode;
    use mongodb::bson::doc;
    use std::sync::Arc;

    #[tokio::test]
    async fn returns_records_with_string_ids() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_many(vec![doc! { "name": "a" }, doc! { "name": "b" }])
            .await
            .unwrap();
        let state = AppState::new(store);

        let Json(records) = list(State(state)).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "a");
        assert_eq!(records[1]["name"], "b");
        assert!(records.iter().all(|r| r["_id"].is_string()));
    }

    #[tokio::test]
    async fn store_failure_is_a_server_error() {
        let store = Arc::new(MemoryStore::new());
        store.shutdown().await;
        let state = AppState::new(store);

        let response = list(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
