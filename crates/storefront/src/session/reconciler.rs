//! Session reconciliation state machine.
//!
//! Two independently-updating sources claim to know who the current user
//! is: the remote identity provider (authoritative) and the local
//! session cache (fallback for offline resume and purely local logins).
//! [`SessionState`] merges them into a single `Identity | None` plus a
//! `loading` flag.
//!
//! Rules, in precedence order:
//! - A remote signed-in event always wins and suppresses cache writes.
//! - A remote signed-out event consults the cache exactly once, during
//!   initialization. After that it ends a remote-backed session but is a
//!   no-op for purely local logins.
//! - The cache is written iff an identity is present and remote is
//!   inactive; it is cleared iff no identity is present; it is never
//!   touched while `loading` is still true.

use std::sync::Arc;

use numa_core::{Identity, UserId};
use serde::Serialize;

use crate::provider::RemoteUser;
use crate::session::cache::SessionStore;

/// Display name used when an account has neither a display name nor a
/// usable email local part.
const FALLBACK_DISPLAY_NAME: &str = "Numa Üyesi";

/// Observable session state handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// The current user, if any.
    pub identity: Option<Identity>,
    /// True until the first remote event resolves the initial state.
    pub loading: bool,
    /// Whether the login modal is currently open.
    pub login_modal_open: bool,
}

/// The reconciliation state machine.
///
/// Owned exclusively by the session controller; everything here is
/// synchronous and infallible (cache write failures are logged, not
/// propagated - persistence is best-effort by design of the original
/// contract).
pub struct SessionState {
    identity: Option<Identity>,
    loading: bool,
    remote_active: bool,
    login_modal_open: bool,
    cache: Arc<dyn SessionStore>,
}

impl SessionState {
    /// Create a state machine in the `Initializing` state.
    ///
    /// Nothing is read from the cache yet: the first remote event
    /// decides whether the cache applies at all.
    #[must_use]
    pub fn new(cache: Arc<dyn SessionStore>) -> Self {
        Self {
            identity: None,
            loading: true,
            remote_active: false,
            login_modal_open: false,
            cache,
        }
    }

    /// The observable state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.identity.clone(),
            loading: self.loading,
            login_modal_open: self.login_modal_open,
        }
    }

    /// Whether the current identity is backed by an active remote
    /// session.
    #[must_use]
    pub const fn remote_active(&self) -> bool {
        self.remote_active
    }

    /// Apply one event from the remote identity stream.
    pub fn handle_remote_event(&mut self, event: Option<RemoteUser>) {
        match event {
            Some(user) => {
                // Remote is authoritative: overrides any local state.
                self.identity = Some(map_remote_user(&user));
                self.remote_active = true;
                self.loading = false;
            }
            None if self.loading => {
                // One-time fallback: remote confirmed absent during
                // initialization, so the cache decides. An identity set
                // by an explicit login racing initialization is kept.
                if self.identity.is_none() {
                    self.identity = self.cache.load();
                }
                self.remote_active = false;
                self.loading = false;
            }
            None if self.remote_active => {
                // The remote session ended out from under us.
                self.remote_active = false;
                self.identity = None;
            }
            None => {
                // Purely local session: the remote already considered
                // the user absent, nothing to reconcile.
                return;
            }
        }
        self.sync_cache();
    }

    /// Set the identity unconditionally (purely local or simulated
    /// login). Never contacts the provider. Closes the login modal.
    pub fn login(&mut self, identity: Identity) {
        self.identity = Some(identity);
        self.login_modal_open = false;
        self.sync_cache();
    }

    /// Clear all session state: identity, remote flag, modal, cache.
    ///
    /// This is the local half of logout; requesting remote sign-out is
    /// the controller's job. Also ends initialization - after an
    /// explicit logout there is no pending decision left.
    pub fn clear(&mut self) {
        self.identity = None;
        self.remote_active = false;
        self.login_modal_open = false;
        self.loading = false;
        self.sync_cache();
    }

    /// Open the login modal.
    pub fn open_login_modal(&mut self) {
        self.login_modal_open = true;
    }

    /// Close the login modal.
    pub fn close_login_modal(&mut self) {
        self.login_modal_open = false;
    }

    /// Re-establish the cache invariant after a state transition.
    ///
    /// Written iff identity present and remote inactive; cleared iff
    /// identity absent; untouched while loading (a snapshot taken before
    /// initialization resolves must not clobber the stored record).
    fn sync_cache(&self) {
        if self.loading {
            return;
        }

        let result = match (&self.identity, self.remote_active) {
            (Some(identity), false) => self.cache.save(identity),
            (None, _) => self.cache.clear(),
            (Some(_), true) => Ok(()),
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "session cache sync failed");
        }
    }
}

/// Map a remote account record to the unified identity.
///
/// Name precedence: provider display name, then the email local part,
/// then a fixed fallback label.
pub(crate) fn map_remote_user(user: &RemoteUser) -> Identity {
    let name = user
        .display_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| {
            let local = user.email.local_part();
            if local.is_empty() {
                FALLBACK_DISPLAY_NAME.to_owned()
            } else {
                local.to_owned()
            }
        });

    Identity {
        id: UserId::new(&user.uid),
        name,
        email: user.email.clone(),
        phone: user.phone_number.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::cache::MemorySessionStore;
    use numa_core::Email;

    fn remote(uid: &str, email: &str, name: Option<&str>) -> RemoteUser {
        RemoteUser {
            uid: uid.to_owned(),
            email: Email::parse(email).unwrap(),
            display_name: name.map(ToOwned::to_owned),
            phone_number: None,
        }
    }

    fn ayse() -> Identity {
        Identity::new("1", "Ayşe", Email::parse("ayse@x.com").unwrap())
    }

    fn fresh() -> (SessionState, Arc<MemorySessionStore>) {
        let cache = Arc::new(MemorySessionStore::new());
        (SessionState::new(Arc::clone(&cache) as Arc<dyn SessionStore>), cache)
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    #[test]
    fn test_starts_loading_with_no_identity() {
        let (state, _) = fresh();
        let snap = state.snapshot();
        assert!(snap.loading);
        assert_eq!(snap.identity, None);
        assert!(!snap.login_modal_open);
    }

    #[test]
    fn test_init_remote_absent_no_cache() {
        let (mut state, _) = fresh();
        state.handle_remote_event(None);

        let snap = state.snapshot();
        assert!(!snap.loading);
        assert_eq!(snap.identity, None);
    }

    #[test]
    fn test_init_falls_back_to_cached_identity() {
        // The cached-Ayşe scenario: local record, no remote session.
        let cache = Arc::new(MemorySessionStore::with_identity(ayse()));
        let mut state = SessionState::new(Arc::clone(&cache) as Arc<dyn SessionStore>);

        state.handle_remote_event(None);

        let snap = state.snapshot();
        assert!(!snap.loading);
        assert_eq!(snap.identity, Some(ayse()));
    }

    #[test]
    fn test_init_remote_present_ignores_cache() {
        let cache = Arc::new(MemorySessionStore::with_identity(ayse()));
        let mut state = SessionState::new(Arc::clone(&cache) as Arc<dyn SessionStore>);

        state.handle_remote_event(Some(remote("9", "merve@x.com", Some("Merve"))));

        let identity = state.snapshot().identity.unwrap();
        assert_eq!(identity.id, UserId::new("9"));
        assert_eq!(identity.name, "Merve");
    }

    // =========================================================================
    // Remote event precedence
    // =========================================================================

    #[test]
    fn test_identity_tracks_most_recent_remote_event() {
        let (mut state, _) = fresh();

        state.handle_remote_event(Some(remote("1", "a@x.com", Some("A"))));
        state.handle_remote_event(Some(remote("2", "b@x.com", Some("B"))));
        assert_eq!(state.snapshot().identity.unwrap().id, UserId::new("2"));

        state.handle_remote_event(None);
        assert_eq!(state.snapshot().identity, None);
    }

    #[test]
    fn test_remote_event_overrides_local_login() {
        let (mut state, _) = fresh();
        state.handle_remote_event(None);
        state.login(ayse());

        state.handle_remote_event(Some(remote("9", "merve@x.com", Some("Merve"))));
        assert_eq!(state.snapshot().identity.unwrap().id, UserId::new("9"));
    }

    #[test]
    fn test_post_init_signed_out_event_keeps_local_login() {
        let (mut state, _) = fresh();
        state.handle_remote_event(None);
        state.login(ayse());

        // The remote already considered the user absent; its repeated
        // signed-out event must not clobber the local session.
        state.handle_remote_event(None);
        assert_eq!(state.snapshot().identity, Some(ayse()));
    }

    #[test]
    fn test_post_init_signed_out_event_ends_remote_session() {
        let (mut state, cache) = fresh();
        state.handle_remote_event(Some(remote("9", "merve@x.com", None)));

        state.handle_remote_event(None);
        assert_eq!(state.snapshot().identity, None);
        assert_eq!(cache.load(), None);
    }

    // =========================================================================
    // Display name mapping
    // =========================================================================

    #[test]
    fn test_name_falls_back_to_email_local_part() {
        let user = remote("1", "ayse@x.com", None);
        assert_eq!(map_remote_user(&user).name, "ayse");
    }

    #[test]
    fn test_blank_display_name_falls_back() {
        let user = remote("1", "ayse@x.com", Some("   "));
        assert_eq!(map_remote_user(&user).name, "ayse");
    }

    #[test]
    fn test_display_name_preferred() {
        let user = remote("1", "ayse@x.com", Some("Ayşe"));
        assert_eq!(map_remote_user(&user).name, "Ayşe");
    }

    // =========================================================================
    // Cache invariant
    // =========================================================================

    #[test]
    fn test_local_login_writes_cache() {
        let (mut state, cache) = fresh();
        state.handle_remote_event(None);

        state.login(ayse());
        assert_eq!(cache.load(), Some(ayse()));
    }

    #[test]
    fn test_remote_login_does_not_write_cache() {
        let (mut state, cache) = fresh();
        state.handle_remote_event(Some(remote("9", "merve@x.com", None)));

        assert_eq!(cache.load(), None);
    }

    #[test]
    fn test_no_cache_write_while_loading() {
        let (mut state, cache) = fresh();

        // Login before initialization resolves: state changes, cache
        // must not.
        state.login(ayse());
        assert_eq!(cache.load(), None);
        assert_eq!(state.snapshot().identity, Some(ayse()));

        // Initialization resolves to remote-absent: the explicit login
        // survives and is now persisted.
        state.handle_remote_event(None);
        assert_eq!(state.snapshot().identity, Some(ayse()));
        assert_eq!(cache.load(), Some(ayse()));
    }

    #[test]
    fn test_clear_removes_cache_from_any_state() {
        // Local-only session
        let (mut state, cache) = fresh();
        state.handle_remote_event(None);
        state.login(ayse());
        state.clear();
        assert_eq!(state.snapshot().identity, None);
        assert_eq!(cache.load(), None);

        // Remote-backed session
        let (mut state, cache) = fresh();
        state.handle_remote_event(Some(remote("9", "merve@x.com", None)));
        state.clear();
        assert_eq!(state.snapshot().identity, None);
        assert_eq!(cache.load(), None);

        // Already absent
        let (mut state, cache) = fresh();
        state.handle_remote_event(None);
        state.clear();
        assert_eq!(state.snapshot().identity, None);
        assert_eq!(cache.load(), None);

        // Still initializing
        let (mut state, cache) = fresh();
        state.clear();
        assert!(!state.snapshot().loading);
        assert_eq!(cache.load(), None);
    }

    // =========================================================================
    // Modal state
    // =========================================================================

    #[test]
    fn test_login_closes_modal() {
        let (mut state, _) = fresh();
        state.handle_remote_event(None);
        state.open_login_modal();
        assert!(state.snapshot().login_modal_open);

        state.login(ayse());
        assert!(!state.snapshot().login_modal_open);
    }

    #[test]
    fn test_clear_resets_modal() {
        let (mut state, _) = fresh();
        state.handle_remote_event(None);
        state.open_login_modal();

        state.clear();
        assert!(!state.snapshot().login_modal_open);
    }
}
