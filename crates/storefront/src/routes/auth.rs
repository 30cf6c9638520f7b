//! Authentication route handlers.
//!
//! All session mutations go through the session controller; these
//! handlers only validate input, translate errors, and maintain the
//! Sentry user context.

use axum::{Json, extract::State};
use numa_core::{Email, Identity, UserId};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::routes::require_field;
use crate::session::SessionSnapshot;
use crate::state::AppState;

/// Email/password credentials from the login and registration forms.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Input for a purely local (simulated) login.
#[derive(Debug, Deserialize)]
pub struct LocalLoginForm {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Sign in against the remote identity provider.
#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<CredentialsForm>,
) -> Result<Json<SessionSnapshot>> {
    // Required-field validation happens before any provider call
    let email = require_field(form.email, "E-posta alanı zorunludur.")?;
    let password = require_field(form.password, "Şifre alanı zorunludur.")?;

    let snapshot = state.session().sign_in(&email, &password).await?;
    if let Some(identity) = &snapshot.identity {
        set_sentry_user(&identity.id, Some(identity.email.as_str()));
    }
    Ok(Json(snapshot))
}

/// Register a new account and sign it in.
#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<CredentialsForm>,
) -> Result<Json<SessionSnapshot>> {
    let email = require_field(form.email, "E-posta alanı zorunludur.")?;
    let password = require_field(form.password, "Şifre alanı zorunludur.")?;

    let snapshot = state.session().register(&email, &password).await?;
    if let Some(identity) = &snapshot.identity {
        set_sentry_user(&identity.id, Some(identity.email.as_str()));
    }
    Ok(Json(snapshot))
}

/// Purely local login: sets the identity without contacting the
/// provider.
#[instrument(skip(state, form))]
pub async fn login_local(
    State(state): State<AppState>,
    Json(form): Json<LocalLoginForm>,
) -> Result<Json<SessionSnapshot>> {
    let email = require_field(form.email, "E-posta alanı zorunludur.")?;
    let email = Email::parse(&email)
        .map_err(|_| AppError::Validation("Geçerli bir e-posta adresi girin.".to_owned()))?;

    let name = form
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| email.local_part().to_owned());
    let id = form
        .id
        .filter(|id| !id.trim().is_empty())
        .map_or_else(|| UserId::new(Uuid::new_v4().to_string()), UserId::new);

    let identity = Identity {
        id,
        name,
        email,
        phone: form.phone.filter(|phone| !phone.trim().is_empty()),
    };

    let snapshot = state.session().login(identity);
    if let Some(identity) = &snapshot.identity {
        set_sentry_user(&identity.id, Some(identity.email.as_str()));
    }
    Ok(Json(snapshot))
}

/// Log out. Local state is always cleared; a failed remote revocation
/// is reported after the fact.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Json<SessionSnapshot>> {
    let result = state.session().logout().await;
    clear_sentry_user();
    Ok(Json(result?))
}

/// The current session snapshot.
#[instrument(skip(state))]
pub async fn session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session().snapshot())
}

/// Re-verify the provider session's token.
#[instrument(skip(state))]
pub async fn verify(State(state): State<AppState>) -> Result<Json<SessionSnapshot>> {
    Ok(Json(state.session().verify_session().await?))
}

/// Open the login modal.
#[instrument(skip(state))]
pub async fn open_modal(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session().open_login_modal())
}

/// Close the login modal.
#[instrument(skip(state))]
pub async fn close_modal(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session().close_login_modal())
}
