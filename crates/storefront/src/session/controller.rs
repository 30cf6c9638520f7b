//! Session controller.
//!
//! The single owner of the reconciliation state machine. Consumers get
//! it by dependency injection (it lives in `AppState`) and observe state
//! through snapshots; nothing else in the application mutates session
//! state.
//!
//! Two concurrency obligations live here rather than in the state
//! machine:
//! - exactly one subscription to the provider event stream exists for
//!   the controller's lifetime, driven by a background task that is
//!   aborted on drop, so no event can be delivered after disposal;
//! - a generation counter is bumped by every login, logout, and remote
//!   event, and every async completion re-checks it before applying its
//!   result, so an operation that raced a newer state change is
//!   discarded instead of clobbering it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use numa_core::Identity;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::provider::{IdentityProvider, ProviderError, RemoteUser};
use crate::session::cache::SessionStore;
use crate::session::reconciler::{SessionSnapshot, SessionState};

/// The session controller.
///
/// Not `Clone`: share it behind an `Arc` (as `AppState` does) so that
/// dropping the last handle tears the event driver down.
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    generation: Arc<AtomicU64>,
    snapshots: Arc<watch::Sender<SessionSnapshot>>,
    provider: Option<IdentityProvider>,
    driver: JoinHandle<()>,
}

impl SessionController {
    /// Spawn a controller wired to a provider.
    ///
    /// Subscribes to the provider's event stream and retains a provider
    /// handle for sign-in, sign-out and token verification.
    #[must_use]
    pub fn spawn(provider: &IdentityProvider, cache: Arc<dyn SessionStore>) -> Self {
        Self::build(provider.subscribe(), Some(provider.clone()), cache)
    }

    /// Spawn a controller over a bare event stream, with no provider
    /// attached.
    ///
    /// Remote calls (`sign_in`, `register`, `verify_session`, the
    /// revocation half of `logout`) are unavailable and return
    /// [`ProviderError::Detached`]; everything else behaves normally.
    /// Used by tests and by embeddings that own the provider connection
    /// elsewhere.
    #[must_use]
    pub fn with_events(
        events: watch::Receiver<Option<RemoteUser>>,
        cache: Arc<dyn SessionStore>,
    ) -> Self {
        Self::build(events, None, cache)
    }

    fn build(
        mut events: watch::Receiver<Option<RemoteUser>>,
        provider: Option<IdentityProvider>,
        cache: Arc<dyn SessionStore>,
    ) -> Self {
        let state = Arc::new(Mutex::new(SessionState::new(cache)));
        let generation = Arc::new(AtomicU64::new(0));
        let snapshots = Arc::new(watch::channel(lock(&state).snapshot()).0);

        let driver = tokio::spawn({
            let state = Arc::clone(&state);
            let generation = Arc::clone(&generation);
            let snapshots = Arc::clone(&snapshots);
            async move {
                // Treat the stream's current value as the first event:
                // it resolves the Initializing state (cache fallback on
                // None, remote identity on Some).
                events.mark_changed();
                while events.changed().await.is_ok() {
                    let event = events.borrow_and_update().clone();
                    generation.fetch_add(1, Ordering::SeqCst);
                    let snapshot = {
                        let mut state = lock(&state);
                        state.handle_remote_event(event);
                        state.snapshot()
                    };
                    snapshots.send_replace(snapshot);
                }
            }
        });

        Self {
            state,
            generation,
            snapshots,
            provider,
            driver,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────────────────────

    /// The current session snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.state).snapshot()
    }

    /// Subscribe to session snapshots. A new value is published after
    /// every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Local operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Purely local login: set the identity without contacting the
    /// provider. Closes the login modal.
    pub fn login(&self, identity: Identity) -> SessionSnapshot {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.mutate(|state| state.login(identity))
    }

    /// Open the login modal.
    pub fn open_login_modal(&self) -> SessionSnapshot {
        self.mutate(SessionState::open_login_modal)
    }

    /// Close the login modal.
    pub fn close_login_modal(&self) -> SessionSnapshot {
        self.mutate(SessionState::close_login_modal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Remote operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign in against the remote provider.
    ///
    /// On success the resulting identity is applied immediately (the
    /// event stream delivers the same state; application is idempotent).
    ///
    /// # Errors
    ///
    /// Returns the provider's typed error; the session state is left
    /// unchanged on failure.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionSnapshot, ProviderError> {
        let provider = self.provider()?.clone();
        let started = self.generation.load(Ordering::SeqCst);

        let user = provider.sign_in_with_password(email, password).await?;
        Ok(self.apply_remote_if_fresh(started, Some(user)))
    }

    /// Register a new account against the remote provider and sign it
    /// in.
    ///
    /// # Errors
    ///
    /// Returns the provider's typed error; the session state is left
    /// unchanged on failure.
    pub async fn register(&self, email: &str, password: &str) -> Result<SessionSnapshot, ProviderError> {
        let provider = self.provider()?.clone();
        let started = self.generation.load(Ordering::SeqCst);

        let user = provider.sign_up_with_password(email, password).await?;
        Ok(self.apply_remote_if_fresh(started, Some(user)))
    }

    /// Log out.
    ///
    /// Local state is cleared first - identity, modal state and the
    /// cached record are gone no matter what happens next. If a remote
    /// session was active, sign-out is then requested from the provider
    /// and its failure, if any, is reported to the caller.
    ///
    /// # Errors
    ///
    /// Returns the provider's error when remote revocation fails. The
    /// local session is already cleared at that point.
    pub async fn logout(&self) -> Result<SessionSnapshot, ProviderError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let (was_remote, snapshot) = {
            let mut state = lock(&self.state);
            let was_remote = state.remote_active();
            state.clear();
            (was_remote, state.snapshot())
        };
        self.snapshots.send_replace(snapshot.clone());

        if was_remote && let Some(provider) = &self.provider {
            provider.sign_out().await?;
        }

        Ok(snapshot)
    }

    /// Re-verify the provider session's token and reconcile the result.
    ///
    /// The lookup runs without holding any lock; if a login, logout or
    /// remote event lands in the meantime, the stale result is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns the provider's typed error when the lookup fails.
    pub async fn verify_session(&self) -> Result<SessionSnapshot, ProviderError> {
        let provider = self.provider()?.clone();
        let started = self.generation.load(Ordering::SeqCst);

        let verified = provider.verify_current().await?;
        Ok(self.apply_remote_if_fresh(started, verified))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn provider(&self) -> Result<&IdentityProvider, ProviderError> {
        self.provider.as_ref().ok_or(ProviderError::Detached)
    }

    /// Apply a remote result unless the state has moved on since
    /// `started`; either way, return the current truth.
    fn apply_remote_if_fresh(
        &self,
        started: u64,
        event: Option<RemoteUser>,
    ) -> SessionSnapshot {
        let mut state = lock(&self.state);
        if self.generation.load(Ordering::SeqCst) == started {
            self.generation.fetch_add(1, Ordering::SeqCst);
            state.handle_remote_event(event);
            let snapshot = state.snapshot();
            self.snapshots.send_replace(snapshot.clone());
            return snapshot;
        }
        tracing::debug!("stale remote completion discarded");
        state.snapshot()
    }

    fn mutate(&self, f: impl FnOnce(&mut SessionState)) -> SessionSnapshot {
        let snapshot = {
            let mut state = lock(&self.state);
            f(&mut state);
            state.snapshot()
        };
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        // Tear down the sole event subscription with the controller.
        self.driver.abort();
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::cache::MemorySessionStore;
    use numa_core::Email;
    use std::time::Duration;

    fn remote(uid: &str, email: &str) -> RemoteUser {
        RemoteUser {
            uid: uid.to_owned(),
            email: Email::parse(email).unwrap(),
            display_name: None,
            phone_number: None,
        }
    }

    fn ayse() -> Identity {
        Identity::new("1", "Ayşe", Email::parse("ayse@x.com").unwrap())
    }

    /// Wait until the controller publishes a snapshot matching `pred`.
    async fn wait_for(
        rx: &mut watch::Receiver<SessionSnapshot>,
        pred: impl Fn(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if pred(&rx.borrow()) {
                    return rx.borrow().clone();
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("controller did not reach expected state")
    }

    #[tokio::test]
    async fn test_initializes_from_event_stream() {
        let (_tx, rx) = watch::channel(None);
        let controller =
            SessionController::with_events(rx, Arc::new(MemorySessionStore::new()));

        let mut snaps = controller.subscribe();
        let snap = wait_for(&mut snaps, |s| !s.loading).await;
        assert_eq!(snap.identity, None);
    }

    #[tokio::test]
    async fn test_initializes_from_cached_identity() {
        let (_tx, rx) = watch::channel(None);
        let cache = Arc::new(MemorySessionStore::with_identity(ayse()));
        let controller = SessionController::with_events(rx, cache);

        let mut snaps = controller.subscribe();
        let snap = wait_for(&mut snaps, |s| !s.loading).await;
        assert_eq!(snap.identity, Some(ayse()));
    }

    #[tokio::test]
    async fn test_remote_events_flow_through() {
        let (tx, rx) = watch::channel(None);
        let controller =
            SessionController::with_events(rx, Arc::new(MemorySessionStore::new()));
        let mut snaps = controller.subscribe();
        wait_for(&mut snaps, |s| !s.loading).await;

        tx.send(Some(remote("9", "merve@x.com"))).unwrap();
        let snap = wait_for(&mut snaps, |s| s.identity.is_some()).await;
        assert_eq!(snap.identity.unwrap().name, "merve");

        tx.send(None).unwrap();
        wait_for(&mut snaps, |s| s.identity.is_none()).await;
    }

    #[tokio::test]
    async fn test_local_login_and_logout() {
        let (_tx, rx) = watch::channel(None);
        let cache = Arc::new(MemorySessionStore::new());
        let controller =
            SessionController::with_events(rx, Arc::clone(&cache) as Arc<dyn SessionStore>);
        let mut snaps = controller.subscribe();
        wait_for(&mut snaps, |s| !s.loading).await;

        let snap = controller.login(ayse());
        assert_eq!(snap.identity, Some(ayse()));
        assert_eq!(cache.load(), Some(ayse()));

        let snap = controller.logout().await.unwrap();
        assert_eq!(snap.identity, None);
        assert_eq!(cache.load(), None);
    }

    #[tokio::test]
    async fn test_modal_toggles() {
        let (_tx, rx) = watch::channel(None);
        let controller =
            SessionController::with_events(rx, Arc::new(MemorySessionStore::new()));

        assert!(controller.open_login_modal().login_modal_open);
        assert!(!controller.close_login_modal().login_modal_open);

        controller.open_login_modal();
        let snap = controller.login(ayse());
        assert!(!snap.login_modal_open, "login closes the modal");
    }

    #[tokio::test]
    async fn test_remote_calls_detached_error() {
        let (_tx, rx) = watch::channel(None);
        let controller =
            SessionController::with_events(rx, Arc::new(MemorySessionStore::new()));

        let err = controller.sign_in("ayse@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, ProviderError::Detached));
    }

    #[tokio::test]
    async fn test_drop_tears_down_event_driver() {
        let (tx, rx) = watch::channel(None);
        let controller =
            SessionController::with_events(rx, Arc::new(MemorySessionStore::new()));
        let mut snaps = controller.subscribe();
        wait_for(&mut snaps, |s| !s.loading).await;

        drop(controller);

        // The snapshot channel closes once the driver task and the
        // controller (the only senders) are gone.
        tx.send(Some(remote("9", "merve@x.com"))).ok();
        tokio::time::timeout(Duration::from_secs(1), async {
            while snaps.changed().await.is_ok() {}
        })
        .await
        .expect("snapshot channel should close after drop");
    }

    #[tokio::test]
    async fn test_stale_completion_discarded() {
        let (_tx, rx) = watch::channel(None);
        let controller =
            SessionController::with_events(rx, Arc::new(MemorySessionStore::new()));
        let mut snaps = controller.subscribe();
        wait_for(&mut snaps, |s| !s.loading).await;

        // Simulate an async completion that started before a newer
        // operation (the login below) landed.
        let started = controller.generation.load(Ordering::SeqCst);
        controller.login(ayse());

        let snap = controller.apply_remote_if_fresh(started, Some(remote("9", "merve@x.com")));
        assert_eq!(snap.identity, Some(ayse()), "stale result must not apply");
    }
}
