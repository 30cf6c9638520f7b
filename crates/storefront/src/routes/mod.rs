//! Route handlers for the JSON API surface.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (strict rate limit on credential endpoints)
//! POST /api/auth/login         - Sign in against the remote provider
//! POST /api/auth/register      - Register a new account and sign in
//! POST /api/auth/login-local   - Purely local (simulated) login
//! POST /api/auth/logout        - Log out (local state always cleared)
//! GET  /api/auth/session       - Current session snapshot
//! POST /api/auth/session/verify - Re-verify the provider token
//! POST /api/auth/modal/open    - Open the login modal
//! POST /api/auth/modal/close   - Close the login modal
//!
//! # Favorites
//! GET  /api/favorites          - Current user's favorite product ids
//! POST /api/favorites/toggle   - Toggle a product (returns new state)
//!
//! # Cart
//! GET  /api/cart               - Cart lines plus badge count
//! POST /api/cart/add           - Add an item (cart reloaded after write)
//! POST /api/cart/update        - Set quantity (cart reloaded after write)
//! POST /api/cart/remove        - Remove an item
//! POST /api/cart/clear         - Empty the cart
//! GET  /api/cart/count         - Badge count only
//!
//! # Catalog
//! GET  /api/products           - Product listing
//! GET  /api/settings           - Site settings document
//! ```
//!
//! Handlers are thin consumers of the session controller and the store
//! façades; no reconciliation or cart logic lives here.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod favorites;

use axum::{
    Router,
    routing::{get, post},
};
use numa_core::Identity;

use crate::error::AppError;
use crate::middleware;
use crate::state::AppState;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    // Credential endpoints get the strict limiter
    let auth_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login-local", post(auth::login_local))
        .layer(middleware::auth_rate_limiter());

    let api_routes = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session))
        .route("/api/auth/session/verify", post(auth::verify))
        .route("/api/auth/modal/open", post(auth::open_modal))
        .route("/api/auth/modal/close", post(auth::close_modal))
        .route("/api/favorites", get(favorites::list))
        .route("/api/favorites/toggle", post(favorites::toggle))
        .route("/api/cart", get(cart::show))
        .route("/api/cart/add", post(cart::add))
        .route("/api/cart/update", post(cart::update))
        .route("/api/cart/remove", post(cart::remove))
        .route("/api/cart/clear", post(cart::clear))
        .route("/api/cart/count", get(cart::count))
        .route("/api/products", get(catalog::products))
        .route("/api/settings", get(catalog::settings))
        .layer(middleware::api_rate_limiter());

    Router::new()
        .merge(auth_routes)
        .merge(api_routes)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
}

/// The signed-in identity, or `Unauthorized` for guests.
pub(crate) fn current_identity(state: &AppState) -> Result<Identity, AppError> {
    state
        .session()
        .snapshot()
        .identity
        .ok_or_else(|| AppError::Unauthorized("no active session".to_owned()))
}

/// Validate a required form field before any remote call is made.
pub(crate) fn require_field(value: Option<String>, message: &str) -> Result<String, AppError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        _ => Err(AppError::Validation(message.to_owned())),
    }
}
