//! Cart route handlers.
//!
//! Mutations return the cart as re-read from the store, with the badge
//! count recomputed from the returned lines. Reads degrade to an empty
//! cart on store failure; writes propagate their errors.

use axum::{Json, extract::State};
use numa_core::{CartLine, ProductId, cart_count};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::{current_identity, require_field};
use crate::state::AppState;

/// Cart display data: the lines plus the derived badge count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub count: u32,
}

impl From<Vec<CartLine>> for CartView {
    fn from(lines: Vec<CartLine>) -> Self {
        let count = cart_count(&lines);
        Self { lines, count }
    }
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddForm {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Quantity-update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateForm {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Remove-from-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveForm {
    #[serde(default)]
    pub product_id: Option<String>,
}

/// Badge count response.
#[derive(Debug, Serialize)]
pub struct CartCountView {
    pub count: u32,
}

/// Display the current user's cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<CartView>> {
    let identity = current_identity(&state)?;

    let lines = match state.cart().get(&identity.id, &identity.email).await {
        Ok(lines) => lines,
        Err(e) => {
            tracing::warn!(user = %identity.id, error = %e, "failed to fetch cart, showing empty");
            Vec::new()
        }
    };

    Ok(Json(CartView::from(lines)))
}

/// Add an item to the cart.
#[instrument(skip(state, form))]
pub async fn add(
    State(state): State<AppState>,
    Json(form): Json<AddForm>,
) -> Result<Json<CartView>> {
    let identity = current_identity(&state)?;
    let product_id = ProductId::new(require_field(form.product_id, "Ürün seçilmedi.")?);
    let quantity = form.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::Validation("Adet en az 1 olmalıdır.".to_owned()));
    }

    let lines = state
        .cart()
        .add(&identity.id, &identity.email, CartLine::new(product_id, quantity))
        .await?;

    Ok(Json(CartView::from(lines)))
}

/// Set an item's quantity (zero removes the line).
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    Json(form): Json<UpdateForm>,
) -> Result<Json<CartView>> {
    let identity = current_identity(&state)?;
    let product_id = ProductId::new(require_field(form.product_id, "Ürün seçilmedi.")?);
    let quantity = form
        .quantity
        .ok_or_else(|| AppError::Validation("Adet alanı zorunludur.".to_owned()))?;

    let lines = state
        .cart()
        .set_quantity(&identity.id, &identity.email, &product_id, quantity)
        .await?;

    Ok(Json(CartView::from(lines)))
}

/// Remove an item from the cart.
#[instrument(skip(state, form))]
pub async fn remove(
    State(state): State<AppState>,
    Json(form): Json<RemoveForm>,
) -> Result<Json<CartView>> {
    let identity = current_identity(&state)?;
    let product_id = ProductId::new(require_field(form.product_id, "Ürün seçilmedi.")?);

    let lines = state
        .cart()
        .remove(&identity.id, &identity.email, &product_id)
        .await?;

    Ok(Json(CartView::from(lines)))
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Result<Json<CartView>> {
    let identity = current_identity(&state)?;

    state.cart().clear(&identity.id, &identity.email).await?;
    Ok(Json(CartView::from(Vec::new())))
}

/// Get the cart count badge.
///
/// Guests and store failures both show a zero badge; the header must
/// always render.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Json<CartCountView> {
    let count = match state.session().snapshot().identity {
        Some(identity) => state
            .cart()
            .count(&identity.id, &identity.email)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(user = %identity.id, error = %e, "failed to fetch cart count");
                0
            }),
        None => 0,
    };

    Json(CartCountView { count })
}
