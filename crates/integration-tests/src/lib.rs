//! Integration tests for Numa.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p numa-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_reconciliation` - Session controller over a scripted
//!   identity event stream plus the in-memory session cache
//! - `favorites_cart` - Favorites and cart façades over the in-memory
//!   collection store
//!
//! The tests run entirely in-process: the in-memory store and an
//! explicit `watch` channel stand in for the remote backends, so the
//! observable contracts are exercised without any network.

use std::time::Duration;

use numa_storefront::session::SessionSnapshot;
use tokio::sync::watch;

/// Wait until the controller publishes a snapshot matching `pred`, with
/// a hard timeout so a stuck driver fails the test instead of hanging
/// it.
///
/// # Panics
///
/// Panics when the expected state is not reached within one second.
pub async fn wait_for_snapshot(
    rx: &mut watch::Receiver<SessionSnapshot>,
    pred: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if pred(&rx.borrow()) {
                return rx.borrow().clone();
            }
            rx.changed()
                .await
                .expect("snapshot channel closed before reaching expected state");
        }
    })
    .await
    .expect("controller did not reach expected state in time")
}
