//! Catalog route handlers: site settings and the product listing.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::{Product, SiteSettings};

/// The site settings document.
///
/// Absent (not yet seeded) and unreachable both answer 404; the
/// storefront renders its built-in defaults either way.
#[instrument(skip(state))]
pub async fn settings(State(state): State<AppState>) -> Result<Json<SiteSettings>> {
    match state.catalog().settings().await {
        Ok(Some(settings)) => Ok(Json(settings)),
        Ok(None) => Err(AppError::NotFound("site ayarları".to_owned())),
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch site settings");
            Err(AppError::NotFound("site ayarları".to_owned()))
        }
    }
}

/// The product listing.
///
/// Store failures degrade to an empty list; the browse page renders
/// empty rather than erroring.
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Json<Vec<Product>> {
    let products = match state.catalog().products().await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch products, showing empty");
            Vec::new()
        }
    };
    Json(products)
}
