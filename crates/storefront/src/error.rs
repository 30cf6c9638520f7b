//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors
//! to Sentry before responding. All route handlers return
//! `Result<T, AppError>`; user-facing messages are the fixed localized
//! strings, never internal error details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::provider::{ProviderError, ProviderErrorKind};
use crate::session::SessionCacheError;
use crate::store::StoreError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Identity provider operation failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Collection store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Session cache operation failed.
    #[error("Session cache error: {0}")]
    SessionCache(#[from] SessionCacheError),

    /// A required form field is missing or malformed; checked before
    /// any remote call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation requires a signed-in user.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Store(_) | Self::SessionCache(_) | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Provider(err) => provider_status(err.kind()),
            Self::Store(_) => StatusCode::BAD_GATEWAY,
            Self::SessionCache(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        };

        // Fixed localized messages; internal details stay server-side
        let message = match &self {
            Self::Provider(err) => err.user_message().to_owned(),
            Self::Store(_) => "Mağaza servisine şu anda ulaşılamıyor.".to_owned(),
            Self::SessionCache(_) | Self::Internal(_) => {
                "Beklenmeyen bir hata oluştu.".to_owned()
            }
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(what) => format!("Bulunamadı: {what}"),
            Self::Unauthorized(_) => "Bu işlem için giriş yapmalısınız.".to_owned(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// HTTP status for a classified provider error.
const fn provider_status(kind: ProviderErrorKind) -> StatusCode {
    match kind {
        ProviderErrorKind::UserNotFound | ProviderErrorKind::WrongPassword => {
            StatusCode::UNAUTHORIZED
        }
        ProviderErrorKind::InvalidEmail => StatusCode::BAD_REQUEST,
        ProviderErrorKind::Disabled => StatusCode::FORBIDDEN,
        ProviderErrorKind::EmailInUse => StatusCode::CONFLICT,
        ProviderErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ProviderErrorKind::Network => StatusCode::BAD_GATEWAY,
        ProviderErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from the current identity.
///
/// Call this after successful authentication to associate errors with
/// users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
