//! Remote identity provider client.
//!
//! The provider is the authority on who is signed in. This client wraps
//! its REST API (password sign-in/sign-up, account lookup, token
//! revocation) and doubles as the identity event source: every sign-in
//! publishes `Some(RemoteUser)` and every sign-out publishes `None` on a
//! watch channel that the session controller subscribes to.
//!
//! # Example
//!
//! ```rust,ignore
//! use numa_storefront::provider::IdentityProvider;
//!
//! let provider = IdentityProvider::new(&config.identity);
//! let mut events = provider.subscribe();
//!
//! let user = provider.sign_in_with_password("ayse@x.com", "s3cret").await?;
//! assert_eq!(events.borrow_and_update().as_ref(), Some(&user));
//! ```

mod error;
mod types;

pub use error::{ProviderError, ProviderErrorKind};
pub use types::RemoteUser;

use std::sync::{Arc, Mutex, PoisonError};

use secrecy::ExposeSecret;
use serde_json::json;
use tokio::sync::watch;

use crate::config::IdentityConfig;

use types::{
    AccountInfo, LookupResponse, PasswordCredentials, ProviderErrorBody, ProviderSession,
    TokenResponse,
};

/// Client for the remote identity provider.
///
/// Cheaply cloneable; all clones share the same HTTP client, session
/// tokens, and event channel.
#[derive(Clone)]
pub struct IdentityProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    client: reqwest::Client,
    base_url: String,
    api_key: secrecy::SecretString,
    session: Mutex<Option<ProviderSession>>,
    events: watch::Sender<Option<RemoteUser>>,
}

impl IdentityProvider {
    /// Create a new identity provider client.
    ///
    /// The event channel starts at `None`: the provider is considered
    /// unauthenticated until a sign-in succeeds.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        let (events, _) = watch::channel(None);
        Self {
            inner: Arc::new(ProviderInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
                api_key: config.api_key.clone(),
                session: Mutex::new(None),
                events,
            }),
        }
    }

    /// Subscribe to the identity event stream.
    ///
    /// The receiver's current value is the provider's present state;
    /// subsequent sign-ins and sign-outs arrive as changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<RemoteUser>> {
        self.inner.events.subscribe()
    }

    /// Snapshot of the provider's current account, if authenticated.
    #[must_use]
    pub fn current_user(&self) -> Option<RemoteUser> {
        self.inner.events.borrow().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign in with email and password.
    ///
    /// On success the full account record is looked up (the token
    /// response alone does not carry the phone number), the session
    /// tokens are retained for later revocation, and `Some(user)` is
    /// published on the event stream.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Auth` with the classified kind when the
    /// provider rejects the credentials, `ProviderError::Network` on
    /// transport failure.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<RemoteUser, ProviderError> {
        self.authenticate("signInWithPassword", email, password).await
    }

    /// Create an account with email and password and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Auth` with kind `EmailInUse` when the
    /// address is already registered, `ProviderError::Network` on
    /// transport failure.
    pub async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<RemoteUser, ProviderError> {
        self.authenticate("signUp", email, password).await
    }

    /// Sign out of the active provider session.
    ///
    /// `None` is published on the event stream before the revocation
    /// request is sent: locally the session ends immediately, and a
    /// failed revocation is reported to the caller without resurrecting
    /// the session.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Network` if the revocation request cannot
    /// be delivered.
    pub async fn sign_out(&self) -> Result<(), ProviderError> {
        let session = self.lock_session().take();
        self.inner.events.send_replace(None);

        if let Some(session) = session {
            let response = self
                .inner
                .client
                .post(self.endpoint("revoke"))
                .query(&[("key", self.inner.api_key.expose_secret())])
                .json(&json!({ "refreshToken": session.refresh_token }))
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::classify_failure(response).await);
            }
        }

        Ok(())
    }

    /// Look up the account behind an ID token.
    ///
    /// Pure query: nothing is published on the event stream. The session
    /// controller applies the result itself, guarded by its generation
    /// counter.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Auth` with kind `UserNotFound` when the
    /// token resolves to no account, `ProviderError::Network` on
    /// transport failure.
    pub async fn verify_token(&self, id_token: &str) -> Result<RemoteUser, ProviderError> {
        self.lookup(id_token).await
    }

    /// Verify the retained session's ID token against the provider.
    ///
    /// Returns `Ok(None)` when no provider session is active.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::verify_token`].
    pub async fn verify_current(&self) -> Result<Option<RemoteUser>, ProviderError> {
        let id_token = self
            .lock_session()
            .as_ref()
            .map(|session| session.id_token.clone());

        match id_token {
            Some(id_token) => Ok(Some(self.lookup(&id_token).await?)),
            None => Ok(None),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Shared sign-in/sign-up flow: exchange credentials for tokens,
    /// look up the account, retain the session, publish the event.
    async fn authenticate(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<RemoteUser, ProviderError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(action))
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(&PasswordCredentials {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }

        let tokens: TokenResponse = response.json().await?;
        let user = self.lookup(&tokens.id_token).await?;

        *self.lock_session() = Some(ProviderSession {
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
        });
        self.inner.events.send_replace(Some(user.clone()));

        tracing::info!(uid = %user.uid, "provider sign-in");
        Ok(user)
    }

    /// Fetch the account record for an ID token.
    async fn lookup(&self, id_token: &str) -> Result<RemoteUser, ProviderError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("lookup"))
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(&json!({ "idToken": id_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }

        let lookup: LookupResponse = response.json().await?;
        lookup
            .users
            .into_iter()
            .next()
            .map(AccountInfo::into)
            .ok_or(ProviderError::Auth {
                kind: ProviderErrorKind::UserNotFound,
            })
    }

    /// Map a non-success provider response to a typed error.
    ///
    /// An unreadable or unrecognized error body classifies as `Unknown`
    /// rather than failing a second time.
    async fn classify_failure(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let kind = serde_json::from_str::<ProviderErrorBody>(&body)
            .map_or(ProviderErrorKind::Unknown, |parsed| {
                ProviderErrorKind::from_code(&parsed.error.message)
            });

        tracing::warn!(%status, ?kind, "provider request rejected");
        ProviderError::Auth { kind }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1/accounts:{action}", self.inner.base_url)
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<ProviderSession>> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use url::Url;

    fn test_provider() -> IdentityProvider {
        IdentityProvider::new(&IdentityConfig {
            base_url: Url::parse("https://identity.example.com/").unwrap(),
            api_key: SecretString::from("k-test"),
        })
    }

    #[test]
    fn test_endpoint_building() {
        let provider = test_provider();
        assert_eq!(
            provider.endpoint("signInWithPassword"),
            "https://identity.example.com/v1/accounts:signInWithPassword"
        );
    }

    #[test]
    fn test_starts_unauthenticated() {
        let provider = test_provider();
        assert_eq!(provider.current_user(), None);
        assert_eq!(*provider.subscribe().borrow(), None);
    }
}
