//! Feeds session state changes from the shared client into the UI.

use konto_client::{AuthSessionState, SessionStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Applies every session state change through `apply` until the store's
/// channel closes or `alive` is cleared. The provider clears the flag on
/// cleanup, so a stale task never writes to a dropped signal.
pub(crate) async fn pump_states<F>(store: Arc<SessionStore>, alive: Arc<AtomicBool>, mut apply: F)
where
    F: FnMut(AuthSessionState),
{
    let mut updates = store.watch();
    loop {
        if !alive.load(Ordering::SeqCst) {
            break;
        }
        let next = updates.borrow_and_update().clone();
        apply(next);
        if updates.changed().await.is_err() {
            break;
        }
    }
}
