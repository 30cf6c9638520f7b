//! Session state: local cache, reconciliation, and the controller that
//! owns both.

pub mod cache;
pub mod controller;
pub mod reconciler;

pub use cache::{FileSessionStore, MemorySessionStore, SessionCacheError, SessionStore};
pub use controller::SessionController;
pub use reconciler::{SessionSnapshot, SessionState};
