//! HTTP route handlers.
//!
//! The data API allows any origin (the chart front end is served elsewhere)
//! and is marked `no-cache`, since its contents change whenever the service
//! restarts and reloads the dataset.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod health;
pub mod jsondata;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::{CACHE_CONTROL_API, CACHE_CONTROL_HEALTH};
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router with all routes, CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/jsondata", get(jsondata::list))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_API),
        ));

    // Health checks - never cached
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_HEALTH),
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
