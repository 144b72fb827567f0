//! HTTP server module.
//!
//! Binds the listener and serves the router until SIGTERM/SIGINT, then shuts
//! down gracefully, letting in-flight requests finish.

mod server;
mod shutdown;

pub use server::{bind, serve, ServerError};
