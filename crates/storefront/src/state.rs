//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::NumaConfig;
use crate::provider::IdentityProvider;
use crate::session::{FileSessionStore, SessionController, SessionStore};
use crate::store::{Catalog, CartStore, CollectionStore, FavoritesStore, HttpCollectionStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The session controller lives here and
/// nowhere else; handlers reach session state only through it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: NumaConfig,
    provider: IdentityProvider,
    store: Arc<dyn CollectionStore>,
    session: SessionController,
    favorites: FavoritesStore,
    cart: CartStore,
    catalog: Catalog,
}

impl AppState {
    /// Create the application state from configuration, wiring the real
    /// HTTP backends and the file-backed session cache.
    #[must_use]
    pub fn new(config: NumaConfig) -> Self {
        let provider = IdentityProvider::new(&config.identity);
        let store: Arc<dyn CollectionStore> = Arc::new(HttpCollectionStore::new(&config.store));
        let cache: Arc<dyn SessionStore> =
            Arc::new(FileSessionStore::new(config.session_cache_path.clone()));
        Self::with_backends(config, provider, store, cache)
    }

    /// Create the application state over explicit backends.
    ///
    /// Used by tests to substitute the in-memory store and session
    /// cache.
    #[must_use]
    pub fn with_backends(
        config: NumaConfig,
        provider: IdentityProvider,
        store: Arc<dyn CollectionStore>,
        cache: Arc<dyn SessionStore>,
    ) -> Self {
        let session = SessionController::spawn(&provider, cache);
        let favorites = FavoritesStore::new(Arc::clone(&store));
        let cart = CartStore::new(Arc::clone(&store));
        let catalog = Catalog::new(Arc::clone(&store));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                provider,
                store,
                session,
                favorites,
                cart,
                catalog,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &NumaConfig {
        &self.inner.config
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn provider(&self) -> &IdentityProvider {
        &self.inner.provider
    }

    /// Get a reference to the collection store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CollectionStore> {
        &self.inner.store
    }

    /// Get a reference to the session controller.
    #[must_use]
    pub fn session(&self) -> &SessionController {
        &self.inner.session
    }

    /// Get a reference to the favorites façade.
    #[must_use]
    pub fn favorites(&self) -> &FavoritesStore {
        &self.inner.favorites
    }

    /// Get a reference to the cart façade.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the catalog reader.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
