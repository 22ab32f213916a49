//! Session state machine for UI consumption.
//!
//! `SessionStore` tracks whether anyone is signed in. It starts in
//! `Initializing`, subscribes to auth notifications before the first session
//! fetch resolves, and treats notifications as authoritative: once an event
//! has arrived, a slower initial fetch result is discarded instead of
//! clobbering newer state.

use crate::auth::{AuthClient, AuthSubscription};
use crate::error::Error;
use crate::types::{AuthEvent, Session};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::warn;

/// Where the app currently stands with respect to authentication.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AuthSessionState {
    /// The stored session has not been checked yet. Render placeholders,
    /// not redirects.
    #[default]
    Initializing,
    Authenticated(Session),
    Unauthenticated,
}

impl AuthSessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Initializing | Self::Unauthenticated => None,
        }
    }
}

struct StoreShared {
    tx: watch::Sender<AuthSessionState>,
    resolved: Mutex<bool>,
}

impl StoreShared {
    /// Apply a notification-driven transition. Notifications also settle the
    /// initial state when they land before the first fetch resolves.
    fn apply(&self, next: AuthSessionState) {
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        *resolved = true;
        self.tx.send_replace(next);
    }

    /// Resolve the initial state from the first session fetch. Ignored when a
    /// notification already settled the state.
    fn resolve(&self, next: AuthSessionState) {
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        if *resolved {
            return;
        }
        *resolved = true;
        self.tx.send_replace(next);
    }
}

/// Reactive session state, fed by auth notifications.
///
/// Dropping the store releases its auth subscription.
pub struct SessionStore {
    shared: Arc<StoreShared>,
    _subscription: AuthSubscription,
}

impl SessionStore {
    pub(crate) fn new(auth: &AuthClient) -> Self {
        let (tx, _rx) = watch::channel(AuthSessionState::Initializing);
        let shared = Arc::new(StoreShared {
            tx,
            resolved: Mutex::new(false),
        });

        let observer = Arc::clone(&shared);
        let subscription = auth.on_auth_state_change(move |event, session| {
            let next = match (event, session) {
                (AuthEvent::SignedOut, _) | (_, None) => AuthSessionState::Unauthenticated,
                (_, Some(session)) => AuthSessionState::Authenticated(session),
            };
            observer.apply(next);
        });

        Self {
            shared,
            _subscription: subscription,
        }
    }

    /// Settle the initial state from the first `get_session` result. A fetch
    /// failure logs a warning and resolves to signed out rather than leaving
    /// the UI in `Initializing`.
    pub fn resolve_initial(&self, fetched: Result<Option<Session>, Error>) {
        let next = match fetched {
            Ok(Some(session)) => AuthSessionState::Authenticated(session),
            Ok(None) => AuthSessionState::Unauthenticated,
            Err(err) => {
                warn!("Failed to restore session: {err}");
                AuthSessionState::Unauthenticated
            }
        };
        self.shared.resolve(next);
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AuthSessionState {
        self.shared.tx.borrow().clone()
    }

    /// Receiver for reactive consumers. Each call returns an independent
    /// receiver positioned at the current state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthSessionState> {
        self.shared.tx.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::NoPersistence;
    use crate::transport::Transport;
    use crate::types::User;
    use anyhow::Result;
    use chrono::{TimeDelta, Utc};
    use uuid::Uuid;

    fn session_fixture() -> Session {
        Session {
            access_token: "at-1".to_string(),
            refresh_token: "rt-1".to_string(),
            token_type: "bearer".to_string(),
            expires_at: Utc::now() + TimeDelta::hours(1),
            user: User {
                id: Uuid::from_u128(1),
                email: "ana@example.com".to_string(),
                email_confirmed_at: None,
                created_at: None,
            },
        }
    }

    fn auth_fixture() -> Result<AuthClient> {
        let config = Config::new("http://localhost:9", "public-test-key")?;
        let transport = Arc::new(Transport::new(config)?);
        Ok(AuthClient::new(transport, Arc::new(NoPersistence)))
    }

    #[test]
    fn starts_initializing() -> Result<()> {
        let auth = auth_fixture()?;
        let store = SessionStore::new(&auth);
        assert_eq!(store.state(), AuthSessionState::Initializing);
        Ok(())
    }

    #[test]
    fn resolves_to_authenticated_on_stored_session() -> Result<()> {
        let auth = auth_fixture()?;
        let store = SessionStore::new(&auth);
        store.resolve_initial(Ok(Some(session_fixture())));
        assert!(store.state().is_authenticated());
        Ok(())
    }

    #[test]
    fn resolves_to_unauthenticated_without_session() -> Result<()> {
        let auth = auth_fixture()?;
        let store = SessionStore::new(&auth);
        store.resolve_initial(Ok(None));
        assert_eq!(store.state(), AuthSessionState::Unauthenticated);
        Ok(())
    }

    #[test]
    fn fetch_failure_resolves_to_unauthenticated() -> Result<()> {
        let auth = auth_fixture()?;
        let store = SessionStore::new(&auth);
        store.resolve_initial(Err(Error::Network("connection refused".to_string())));
        assert_eq!(store.state(), AuthSessionState::Unauthenticated);
        Ok(())
    }

    #[tokio::test]
    async fn notification_outranks_slow_initial_fetch() -> Result<()> {
        let auth = auth_fixture()?;
        let store = SessionStore::new(&auth);

        // Sign-out with no session never leaves the process, so the
        // notification lands while the store is still initializing.
        auth.sign_out().await?;
        assert_eq!(store.state(), AuthSessionState::Unauthenticated);

        store.resolve_initial(Ok(Some(session_fixture())));
        assert_eq!(store.state(), AuthSessionState::Unauthenticated);
        Ok(())
    }

    #[test]
    fn late_notification_still_applies() {
        let (tx, _rx) = watch::channel(AuthSessionState::Initializing);
        let shared = StoreShared {
            tx,
            resolved: Mutex::new(false),
        };

        shared.resolve(AuthSessionState::Unauthenticated);
        shared.apply(AuthSessionState::Authenticated(session_fixture()));
        assert!(shared.tx.borrow().is_authenticated());
    }

    #[test]
    fn watchers_see_state_changes() -> Result<()> {
        let auth = auth_fixture()?;
        let store = SessionStore::new(&auth);
        let mut rx = store.watch();

        assert_eq!(*rx.borrow_and_update(), AuthSessionState::Initializing);
        store.resolve_initial(Ok(None));
        assert!(rx.has_changed()?);
        assert_eq!(*rx.borrow_and_update(), AuthSessionState::Unauthenticated);
        Ok(())
    }
}
