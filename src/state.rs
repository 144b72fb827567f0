//! Shared application state for request handlers.

use crate::store::SharedStore;

/// Shared application state, cloneable across handlers.
///
/// The store handle is created by `main` and injected here; handlers never
/// open their own connections.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
}

impl AppState {
    /// Creates a new application state around the given store handle.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}
