//! Auth facade over the remote identity endpoints.
//!
//! `AuthClient` owns the current session. Every successful sign-in, sign-out,
//! and token refresh funnels through one transition point that updates the
//! in-memory session, the configured cache, and every registered observer, in
//! that order. Observers therefore see transitions in the order they
//! happened, never in the order competing calls started.

use crate::error::Error;
use crate::storage::SessionCache;
use crate::transport::Transport;
use crate::types::{AuthEvent, AuthResponse, Session, User};
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::debug;

type Callback = Arc<dyn Fn(AuthEvent, Option<Session>) + Send + Sync>;

struct Observers {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

/// Handle for a registered auth observer. Dropping it stops delivery.
pub struct AuthSubscription {
    id: u64,
    observers: Weak<Mutex<Observers>>,
}

impl AuthSubscription {
    /// Stop receiving auth state notifications.
    pub fn unsubscribe(self) {}
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            let mut observers = observers.lock().unwrap_or_else(PoisonError::into_inner);
            observers.entries.retain(|(id, _)| *id != self.id);
        }
    }
}

pub struct AuthClient {
    transport: Arc<Transport>,
    session: Mutex<Option<Session>>,
    cache: Arc<dyn SessionCache>,
    observers: Arc<Mutex<Observers>>,
    // Serializes transitions so observers never see them interleaved.
    emit_lock: Mutex<()>,
}

impl AuthClient {
    pub(crate) fn new(transport: Arc<Transport>, cache: Arc<dyn SessionCache>) -> Self {
        Self {
            transport,
            session: Mutex::new(None),
            cache,
            observers: Arc::new(Mutex::new(Observers {
                next_id: 0,
                entries: Vec::new(),
            })),
            emit_lock: Mutex::new(()),
        }
    }

    /// Register a new account. When the backend auto-confirms email
    /// addresses the response carries a session and the client signs in
    /// immediately; otherwise only the pending user record comes back and
    /// local state is untouched.
    ///
    /// # Errors
    /// Returns the backend rejection (weak password, duplicate account) or a
    /// transport failure.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let response = self.transport.sign_up(email, password).await?;
        if let Some(session) = response.session.clone() {
            self.transition(Some(session), AuthEvent::SignedIn);
        }
        Ok(response)
    }

    /// Exchange credentials for a session and sign in. Unlike `sign_up`, the
    /// response always carries a session on success.
    ///
    /// # Errors
    /// Returns the backend rejection (bad credentials, unconfirmed email) or
    /// a transport failure. Local state only changes on success.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, Error> {
        let session = self.transport.password_grant(email, password).await?;
        self.transition(Some(session.clone()), AuthEvent::SignedIn);
        Ok(AuthResponse {
            user: session.user.clone(),
            session: Some(session),
        })
    }

    /// Revoke the current session remotely and clear local state.
    ///
    /// A backend answer of 401, 403, or 404 means the session is already gone
    /// server-side, so local state is cleared and the call succeeds. Transport
    /// failures leave local state in place for a retry.
    ///
    /// # Errors
    /// Returns transport failures and backend rejections other than the
    /// already-gone statuses above.
    pub async fn sign_out(&self) -> Result<(), Error> {
        let token = self.current_or_restored().map(|s| s.access_token);
        let Some(token) = token else {
            self.transition(None, AuthEvent::SignedOut);
            return Ok(());
        };

        match self.transport.logout(&token).await {
            Ok(()) => {
                self.transition(None, AuthEvent::SignedOut);
                Ok(())
            }
            Err(err) => match err.as_api() {
                Some(api) if matches!(api.status, 401 | 403 | 404) => {
                    self.transition(None, AuthEvent::SignedOut);
                    Ok(())
                }
                _ => Err(err),
            },
        }
    }

    /// Request a password reset email.
    ///
    /// The backend answers the same way whether or not the address is
    /// registered, so success here never confirms account existence.
    ///
    /// # Errors
    /// Returns transport failures only.
    pub async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
    ) -> Result<(), Error> {
        self.transport.recover(email, redirect_to).await
    }

    /// Return the current session, restoring it from the cache and refreshing
    /// it when expired.
    ///
    /// An expired session that the backend refuses to refresh is discarded
    /// and the call resolves to `Ok(None)`; observers get a sign-out
    /// notification. Transport failures leave the stored session alone.
    ///
    /// # Errors
    /// Returns transport failures from the refresh attempt.
    pub async fn get_session(&self) -> Result<Option<Session>, Error> {
        let Some(session) = self.current_or_restored() else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        debug!("stored session expired, refreshing");
        match self.transport.refresh_grant(&session.refresh_token).await {
            Ok(fresh) => {
                self.transition(Some(fresh.clone()), AuthEvent::TokenRefreshed);
                Ok(Some(fresh))
            }
            Err(err) if err.as_api().is_some() => {
                self.transition(None, AuthEvent::SignedOut);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Fetch the user record behind the current session, validated against
    /// the server. Resolves to `Ok(None)` when nobody is signed in or the
    /// server no longer accepts the token.
    ///
    /// # Errors
    /// Returns transport failures and backend rejections other than 401.
    pub async fn get_user(&self) -> Result<Option<User>, Error> {
        let Some(session) = self.get_session().await? else {
            return Ok(None);
        };
        match self.transport.user(&session.access_token).await {
            Ok(user) => Ok(Some(user)),
            Err(err) => match err.as_api() {
                Some(api) if api.status == 401 => Ok(None),
                _ => Err(err),
            },
        }
    }

    /// Register an observer for auth state transitions. Callbacks run on the
    /// thread performing the transition and must not block.
    pub fn on_auth_state_change<F>(&self, callback: F) -> AuthSubscription
    where
        F: Fn(AuthEvent, Option<Session>) + Send + Sync + 'static,
    {
        let mut observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = observers.next_id;
        observers.next_id += 1;
        observers.entries.push((id, Arc::new(callback)));
        AuthSubscription {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }

    /// Current in-memory session, falling back to the cache. A cache hit is
    /// installed silently; restoring is not a transition.
    fn current_or_restored(&self) -> Option<Session> {
        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = self.cache.load();
        }
        slot.clone()
    }

    fn transition(&self, session: Option<Session>, event: AuthEvent) {
        let _emit = self
            .emit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        {
            let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            slot.clone_from(&session);
        }
        match &session {
            Some(fresh) => self.cache.store(fresh),
            None => self.cache.clear(),
        }

        let callbacks: Vec<Callback> = {
            let observers = self
                .observers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            observers
                .entries
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect()
        };
        for callback in callbacks {
            callback(event, session.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::{MemoryCache, NoPersistence};
    use anyhow::Result;
    use chrono::TimeDelta;
    use uuid::Uuid;

    fn session_fixture(tag: &str) -> Session {
        Session {
            access_token: format!("at-{tag}"),
            refresh_token: format!("rt-{tag}"),
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

    fn auth_with_cache(cache: Arc<dyn SessionCache>) -> Result<AuthClient> {
        // Nothing in these tests sends a request; the port just has to parse.
        let config = Config::new("http://localhost:9", "public-test-key")?;
        let transport = Arc::new(Transport::new(config)?);
        Ok(AuthClient::new(transport, cache))
    }

    #[test]
    fn observers_fire_in_registration_order() -> Result<()> {
        let auth = auth_with_cache(Arc::new(NoPersistence))?;
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&seen);
        let _first_sub = auth.on_auth_state_change(move |event, _| {
            first.lock().expect("lock").push(("first", event));
        });
        let second = Arc::clone(&seen);
        let _second_sub = auth.on_auth_state_change(move |event, _| {
            second.lock().expect("lock").push(("second", event));
        });

        auth.transition(Some(session_fixture("a")), AuthEvent::SignedIn);
        auth.transition(None, AuthEvent::SignedOut);

        let seen = seen.lock().expect("lock");
        assert_eq!(
            *seen,
            vec![
                ("first", AuthEvent::SignedIn),
                ("second", AuthEvent::SignedIn),
                ("first", AuthEvent::SignedOut),
                ("second", AuthEvent::SignedOut),
            ]
        );
        Ok(())
    }

    #[test]
    fn unsubscribe_stops_delivery() -> Result<()> {
        let auth = auth_with_cache(Arc::new(NoPersistence))?;
        let seen = Arc::new(Mutex::new(0_u32));

        let counter = Arc::clone(&seen);
        let subscription = auth.on_auth_state_change(move |_, _| {
            *counter.lock().expect("lock") += 1;
        });

        auth.transition(Some(session_fixture("a")), AuthEvent::SignedIn);
        subscription.unsubscribe();
        auth.transition(None, AuthEvent::SignedOut);

        assert_eq!(*seen.lock().expect("lock"), 1);
        Ok(())
    }

    #[test]
    fn dropped_subscription_stops_delivery() -> Result<()> {
        let auth = auth_with_cache(Arc::new(NoPersistence))?;
        let seen = Arc::new(Mutex::new(0_u32));

        let counter = Arc::clone(&seen);
        let subscription = auth.on_auth_state_change(move |_, _| {
            *counter.lock().expect("lock") += 1;
        });
        drop(subscription);

        auth.transition(Some(session_fixture("a")), AuthEvent::SignedIn);
        assert_eq!(*seen.lock().expect("lock"), 0);
        Ok(())
    }

    #[test]
    fn sign_out_notification_carries_no_session() -> Result<()> {
        let auth = auth_with_cache(Arc::new(NoPersistence))?;
        let seen = Arc::new(Mutex::new(Vec::new()));

        let recorder = Arc::clone(&seen);
        let _sub = auth.on_auth_state_change(move |event, session| {
            recorder
                .lock()
                .expect("lock")
                .push((event, session.is_some()));
        });

        auth.transition(Some(session_fixture("a")), AuthEvent::SignedIn);
        auth.transition(None, AuthEvent::SignedOut);

        let seen = seen.lock().expect("lock");
        assert_eq!(
            *seen,
            vec![(AuthEvent::SignedIn, true), (AuthEvent::SignedOut, false)]
        );
        Ok(())
    }

    #[test]
    fn transitions_write_through_to_cache() -> Result<()> {
        let cache = Arc::new(MemoryCache::new());
        let auth = auth_with_cache(Arc::clone(&cache) as Arc<dyn SessionCache>)?;

        auth.transition(Some(session_fixture("a")), AuthEvent::SignedIn);
        assert!(cache.load().is_some());

        auth.transition(None, AuthEvent::SignedOut);
        assert!(cache.load().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn get_session_restores_valid_session_from_cache() -> Result<()> {
        let cache = Arc::new(MemoryCache::preloaded(session_fixture("cached")));
        let auth = auth_with_cache(cache as Arc<dyn SessionCache>)?;

        let session = auth.get_session().await?.expect("cached session");
        assert_eq!(session.access_token, "at-cached");
        Ok(())
    }

    #[tokio::test]
    async fn get_session_is_none_without_stored_state() -> Result<()> {
        let auth = auth_with_cache(Arc::new(NoPersistence))?;
        assert!(auth.get_session().await?.is_none());
        Ok(())
    }
}
