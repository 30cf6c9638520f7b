//! Favorites route handlers.
//!
//! Reads degrade to an empty set on store failure (the heart icons just
//! render unfilled); writes propagate their errors so the client can
//! surface them.

use std::collections::BTreeSet;

use axum::{Json, extract::State};
use numa_core::ProductId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::routes::{current_identity, require_field};
use crate::state::AppState;

/// The signed-in user's favorites.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesView {
    pub product_ids: BTreeSet<ProductId>,
    pub count: usize,
}

/// Toggle request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleForm {
    #[serde(default)]
    pub product_id: Option<String>,
}

/// Toggle response: the product's new membership state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub product_id: ProductId,
    pub favorite: bool,
}

/// List the current user's favorite product ids.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<FavoritesView>> {
    let identity = current_identity(&state)?;

    let product_ids = match state.favorites().get(&identity.id, &identity.email).await {
        Ok(set) => set,
        Err(e) => {
            tracing::warn!(user = %identity.id, error = %e, "failed to fetch favorites, showing empty");
            BTreeSet::new()
        }
    };

    let count = product_ids.len();
    Ok(Json(FavoritesView {
        product_ids,
        count,
    }))
}

/// Toggle a product in the current user's favorites.
#[instrument(skip(state, form))]
pub async fn toggle(
    State(state): State<AppState>,
    Json(form): Json<ToggleForm>,
) -> Result<Json<ToggleResponse>> {
    let identity = current_identity(&state)?;
    let product_id = ProductId::new(require_field(form.product_id, "Ürün seçilmedi.")?);

    let favorite = state
        .favorites()
        .toggle(&identity.id, &identity.email, &product_id)
        .await?;

    Ok(Json(ToggleResponse {
        product_id,
        favorite,
    }))
}
