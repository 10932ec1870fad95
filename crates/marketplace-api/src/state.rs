//! Shared application state for the marketplace API.
//!
//! [`AppState`] owns the store every handler talks to. It is generic over
//! the [`Marketplace`] implementation so the same router serves the
//! `PostgreSQL` store in production and the in-memory store in tests.

use marketplace_core::Marketplace;

/// State shared by every request handler.
#[derive(Debug)]
pub struct AppState<S> {
    /// The marketplace store.
    pub store: S,
    /// Row limit for `best-clients` when the request gives none.
    pub best_clients_default_limit: u32,
}

impl<S: Marketplace> AppState<S> {
    /// Wrap a store with the given default `best-clients` limit.
    pub const fn new(store: S, best_clients_default_limit: u32) -> Self {
        Self {
            store,
            best_clients_default_limit,
        }
    }
}
