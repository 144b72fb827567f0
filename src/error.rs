use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let message = match &self {
            AppError::Store(_) => "Failed to read records from the database",
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
