//! Remote collection store clients and the per-user CRUD façades.
//!
//! # Architecture
//!
//! - The store is a document database behind an HTTP API; this module
//!   speaks to it through the [`CollectionStore`] trait (read, merge
//!   write, add-with-auto-id, delete, list).
//! - The store is the source of truth - no local sync, direct calls.
//! - [`FavoritesStore`] and [`CartStore`] are thin façades over the
//!   trait, keyed by `(UserId, Email)`.
//! - Catalog reads go through a short-TTL in-memory cache (`moka`).
//!
//! Each call is an independent round trip; nothing here is
//! transactional. Concurrent writers race last-write-wins, which is the
//! store's own policy.

pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod http;
pub mod memory;

pub use cart::CartStore;
pub use catalog::{Catalog, Product, SiteSettings};
pub use favorites::FavoritesStore;
pub use http::HttpCollectionStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use numa_core::UserId;
use serde_json::Value;
use thiserror::Error;

/// Document path of the site settings singleton.
pub const SETTINGS_PATH: &str = "settings/site";

/// Collection holding product documents.
pub const PRODUCTS_COLLECTION: &str = "products";

/// Document path of a user's favorites record.
#[must_use]
pub fn favorites_path(user: &UserId) -> String {
    format!("users/{user}/favorites")
}

/// Document path of a user's cart record.
#[must_use]
pub fn cart_path(user: &UserId) -> String {
    format!("users/{user}/cart")
}

/// Errors from collection store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure; read-path callers log this and degrade
    /// to an empty result.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[source] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store request failed with status {0}")]
    Backend(u16),

    /// A document exists but does not match the expected shape.
    #[error("malformed document at {path}: {source}")]
    Decode {
        /// Document path of the offending record.
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A document-oriented collection store.
///
/// Documents are JSON objects addressed by `collection/document` paths
/// (per-user records live under `users/{uid}/...`). Implementations:
/// [`HttpCollectionStore`] for the remote store, [`MemoryStore`] for
/// tests and local development.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Read a document. `Ok(None)` when it does not exist.
    async fn get_document(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Write a document. With `merge`, top-level fields are merged into
    /// any existing document; without, the document is replaced.
    async fn set_document(&self, path: &str, value: Value, merge: bool) -> Result<(), StoreError>;

    /// Add a document to a collection under a store-assigned id, which
    /// is returned.
    async fn add_document(&self, collection: &str, value: Value) -> Result<String, StoreError>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete_document(&self, path: &str) -> Result<(), StoreError>;

    /// List a collection's documents as `(id, value)` pairs.
    async fn list_documents(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_user_document_paths() {
        let user = UserId::new("u-42");
        assert_eq!(favorites_path(&user), "users/u-42/favorites");
        assert_eq!(cart_path(&user), "users/u-42/cart");
    }
}
