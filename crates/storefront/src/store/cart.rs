//! Cart façade.
//!
//! One document per user (`users/{uid}/cart`) holding the owner's email
//! and the cart lines (unique product per line). After `add` and
//! `set_quantity` the cart is re-read from the store and the reloaded
//! lines are returned - consistency over latency. The badge count is
//! recomputed from the returned lines after every mutation.

use std::sync::Arc;

use numa_core::{CartLine, Email, UserId, cart_count};
use serde::{Deserialize, Serialize};

use crate::store::{CollectionStore, StoreError, cart_path};

/// Per-user cart CRUD over the collection store.
#[derive(Clone)]
pub struct CartStore {
    store: Arc<dyn CollectionStore>,
}

/// The stored cart record.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<Email>,
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl CartStore {
    /// Create a cart façade over a collection store.
    #[must_use]
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// The user's cart lines. An absent document is an empty cart.
    ///
    /// # Errors
    ///
    /// `StoreError::BackendUnavailable` on transport failure; callers on
    /// read paths log it and treat the cart as empty.
    pub async fn get(&self, user: &UserId, _email: &Email) -> Result<Vec<CartLine>, StoreError> {
        Ok(self.read_doc(user).await?.lines)
    }

    /// Add units of a product, merging into an existing line.
    ///
    /// Returns the cart re-read from the store after the write.
    ///
    /// # Errors
    ///
    /// Write-path failures propagate to the caller.
    pub async fn add(
        &self,
        user: &UserId,
        email: &Email,
        line: CartLine,
    ) -> Result<Vec<CartLine>, StoreError> {
        let mut doc = self.read_doc(user).await?;
        doc.email = Some(email.clone());

        match doc.lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => doc.lines.push(line),
        }

        self.write_doc(user, &doc).await?;
        self.get(user, email).await
    }

    /// Remove a product's line entirely.
    ///
    /// # Errors
    ///
    /// Write-path failures propagate to the caller.
    pub async fn remove(
        &self,
        user: &UserId,
        email: &Email,
        product: &numa_core::ProductId,
    ) -> Result<Vec<CartLine>, StoreError> {
        let mut doc = self.read_doc(user).await?;
        doc.email = Some(email.clone());
        doc.lines.retain(|line| line.product_id != *product);

        self.write_doc(user, &doc).await?;
        Ok(doc.lines)
    }

    /// Set a product's quantity. Zero removes the line.
    ///
    /// Returns the cart re-read from the store after the write.
    ///
    /// # Errors
    ///
    /// Write-path failures propagate to the caller.
    pub async fn set_quantity(
        &self,
        user: &UserId,
        email: &Email,
        product: &numa_core::ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLine>, StoreError> {
        let mut doc = self.read_doc(user).await?;
        doc.email = Some(email.clone());

        if quantity == 0 {
            doc.lines.retain(|line| line.product_id != *product);
        } else {
            match doc.lines.iter_mut().find(|l| l.product_id == *product) {
                Some(existing) => existing.quantity = quantity,
                None => doc.lines.push(CartLine::new(product.clone(), quantity)),
            }
        }

        self.write_doc(user, &doc).await?;
        self.get(user, email).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Write-path failures propagate to the caller.
    pub async fn clear(&self, user: &UserId, _email: &Email) -> Result<(), StoreError> {
        self.store.delete_document(&cart_path(user)).await
    }

    /// The badge count for the user's cart.
    ///
    /// # Errors
    ///
    /// `StoreError::BackendUnavailable` on transport failure.
    pub async fn count(&self, user: &UserId, email: &Email) -> Result<u32, StoreError> {
        Ok(cart_count(&self.get(user, email).await?))
    }

    async fn read_doc(&self, user: &UserId) -> Result<CartDoc, StoreError> {
        let path = cart_path(user);
        match self.store.get_document(&path).await? {
            Some(value) => {
                serde_json::from_value(value).map_err(|source| StoreError::Decode { path, source })
            }
            None => Ok(CartDoc::default()),
        }
    }

    async fn write_doc(&self, user: &UserId, doc: &CartDoc) -> Result<(), StoreError> {
        let path = cart_path(user);
        let value =
            serde_json::to_value(doc).map_err(|source| StoreError::Decode { path: path.clone(), source })?;
        self.store.set_document(&path, value, false).await
    }
}
