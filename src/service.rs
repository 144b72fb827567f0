//! Service lifecycle after the store is connected.
//!
//! Loads the dataset, binds the listener and serves until shutdown. The store
//! handle is shut down on the way out whether that ends in an error or not.

use crate::bootstrap::{self, BootstrapError};
use crate::config::AppConfig;
use crate::http::{self, ServerError};
use crate::routes::create_router;
use crate::state::AppState;
use crate::store::{DocumentStore, SharedStore};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Run the service on `db`, then shut the store down.
pub async fn run(config: &AppConfig, db: SharedStore) -> Result<(), ServiceError> {
    let result = start(config, &db).await;
    db.shutdown().await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Service stopped with an error");
    } else {
        tracing::info!("Server stopped");
    }
    result
}

async fn start(config: &AppConfig, db: &SharedStore) -> Result<(), ServiceError> {
    bootstrap::run(db.as_ref(), &config.dataset).await?;

    let listener = http::bind(&config.http).await?;
    let app = create_router(AppState::new(db.clone()));
    http::serve(listener, app).await?;
    Ok(())
}
