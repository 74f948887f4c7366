//! Login state listeners.
//!
//! The session announces every completed login with `true` and every logout
//! or reset with `false`. Listeners that react by reloading data (the
//! collections view, for one) are expected to treat repeated announcements
//! as harmless.

use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use tracing::debug;

/// Receives the logged-in flag after login, logout and reset.
///
/// Called from the task that completed the operation, after the session
/// state has been updated. Implementations must not block.
pub trait SessionObserver: Send + Sync {
    fn login_state_changed(&self, logged_in: bool);
}

impl<F> SessionObserver for F
where
    F: Fn(bool) + Send + Sync,
{
    fn login_state_changed(&self, logged_in: bool) {
        self(logged_in)
    }
}

/// Reloads a view on every login state change, regardless of direction.
///
/// # Example
///
/// ```
/// use core_auth::{CollectionReloader, SessionObserver};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let reloads = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&reloads);
/// let reloader = CollectionReloader::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// reloader.login_state_changed(true);
/// reloader.login_state_changed(false);
/// assert_eq!(reloads.load(Ordering::SeqCst), 2);
/// ```
pub struct CollectionReloader<F> {
    reload: F,
}

impl<F> CollectionReloader<F>
where
    F: Fn() + Send + Sync,
{
    pub fn new(reload: F) -> Self {
        Self { reload }
    }
}

impl<F> SessionObserver for CollectionReloader<F>
where
    F: Fn() + Send + Sync,
{
    fn login_state_changed(&self, logged_in: bool) {
        debug!(logged_in = logged_in, "Reloading collections");
        (self.reload)()
    }
}

/// Publishes `AuthEvent::LoginStateChanged` for channel-based listeners
impl SessionObserver for EventBus {
    fn login_state_changed(&self, logged_in: bool) {
        if self
            .emit(CoreEvent::Auth(AuthEvent::LoginStateChanged { logged_in }))
            .is_err()
        {
            debug!(logged_in = logged_in, "No subscribers for login state change");
        }
    }
}
