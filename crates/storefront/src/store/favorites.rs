//! Favorites façade.
//!
//! One document per user (`users/{uid}/favorites`) holding the owner's
//! email and the set of liked product ids. Toggling is read-then-write
//! of the whole document - not atomic across retries; concurrent
//! toggles on the same product race last-write-wins, which is the
//! store's policy.

use std::collections::BTreeSet;
use std::sync::Arc;

use numa_core::{Email, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::store::{CollectionStore, StoreError, favorites_path};

/// Per-user favorites CRUD over the collection store.
#[derive(Clone)]
pub struct FavoritesStore {
    store: Arc<dyn CollectionStore>,
}

/// The stored favorites record.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoritesDoc {
    /// Owner email, stored alongside the uid-keyed path so the record
    /// carries the full user key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<Email>,
    #[serde(default)]
    product_ids: BTreeSet<ProductId>,
}

impl FavoritesStore {
    /// Create a favorites façade over a collection store.
    #[must_use]
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// The user's favorite product ids. An absent document is an empty
    /// set.
    ///
    /// # Errors
    ///
    /// `StoreError::BackendUnavailable` on transport failure; callers on
    /// read paths log it and treat the set as empty.
    pub async fn get(&self, user: &UserId, _email: &Email) -> Result<BTreeSet<ProductId>, StoreError> {
        Ok(self.read_doc(user).await?.product_ids)
    }

    /// Whether a product is in the user's favorites.
    ///
    /// # Errors
    ///
    /// `StoreError::BackendUnavailable` on transport failure.
    pub async fn contains(
        &self,
        user: &UserId,
        email: &Email,
        product: &ProductId,
    ) -> Result<bool, StoreError> {
        Ok(self.get(user, email).await?.contains(product))
    }

    /// Toggle a product's membership and return the new state (`true` =
    /// now a favorite).
    ///
    /// # Errors
    ///
    /// Write-path failures propagate to the caller.
    pub async fn toggle(
        &self,
        user: &UserId,
        email: &Email,
        product: &ProductId,
    ) -> Result<bool, StoreError> {
        let mut doc = self.read_doc(user).await?;
        doc.email = Some(email.clone());

        let now_favorite = if doc.product_ids.remove(product) {
            false
        } else {
            doc.product_ids.insert(product.clone());
            true
        };

        self.write_doc(user, &doc).await?;
        Ok(now_favorite)
    }

    async fn read_doc(&self, user: &UserId) -> Result<FavoritesDoc, StoreError> {
        let path = favorites_path(user);
        match self.store.get_document(&path).await? {
            Some(value) => {
                serde_json::from_value(value).map_err(|source| StoreError::Decode { path, source })
            }
            None => Ok(FavoritesDoc::default()),
        }
    }

    async fn write_doc(&self, user: &UserId, doc: &FavoritesDoc) -> Result<(), StoreError> {
        let path = favorites_path(user);
        let value =
            serde_json::to_value(doc).map_err(|source| StoreError::Decode { path: path.clone(), source })?;
        self.store.set_document(&path, value, false).await
    }
}
