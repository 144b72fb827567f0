//! Visualization data service.
//!
//! Loads a JSON dataset into a document collection at startup and serves the
//! whole collection at `GET /api/jsondata`. The binary in `main.rs` wires the
//! pieces together; they are exposed here for integration tests.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod record;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
