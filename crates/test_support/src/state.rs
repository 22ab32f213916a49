//! In-memory accounts, sessions, and profile rows behind the stub backend.
//!
//! Tests reach into this state directly to seed accounts, confirm emails, or
//! revoke sessions without going through the HTTP surface.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Lifetime of access tokens issued by the stub.
pub(crate) const SESSION_TTL_SECONDS: i64 = 3600;

struct StoredUser {
    id: Uuid,
    password: String,
    confirmed: bool,
    created_at: DateTime<Utc>,
}

struct StoredSession {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// Account data as handed to handlers and tests.
#[derive(Clone, Debug)]
pub struct UserSnapshot {
    pub id: Uuid,
    pub email: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub username: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Freshly minted token pair.
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct BackendState {
    users: Mutex<HashMap<String, StoredUser>>,
    sessions: Mutex<HashMap<String, StoredSession>>,
    refresh_tokens: Mutex<HashMap<String, Uuid>>,
    profiles: Mutex<HashMap<Uuid, ProfileRecord>>,
    auto_confirm: AtomicBool,
    signup_calls: AtomicUsize,
    token_calls: AtomicUsize,
    recover_calls: AtomicUsize,
    profile_selects: AtomicUsize,
    profile_upserts: AtomicUsize,
}

impl BackendState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Confirm new accounts immediately instead of leaving them pending.
    pub fn set_auto_confirm(&self, enabled: bool) {
        self.auto_confirm.store(enabled, Ordering::SeqCst);
    }

    #[must_use]
    pub fn auto_confirm(&self) -> bool {
        self.auto_confirm.load(Ordering::SeqCst)
    }

    /// Create an account. Returns `None` when the email is already taken.
    pub fn create_user(
        &self,
        email: &str,
        password: &str,
        confirmed: bool,
    ) -> Option<UserSnapshot> {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        if users.contains_key(email) {
            return None;
        }
        let user = StoredUser {
            id: Uuid::new_v4(),
            password: password.to_string(),
            confirmed,
            created_at: Utc::now(),
        };
        let snapshot = UserSnapshot {
            id: user.id,
            email: email.to_string(),
            confirmed,
            created_at: user.created_at,
        };
        users.insert(email.to_string(), user);
        Some(snapshot)
    }

    /// Check a password. Returns the account even when unconfirmed; the
    /// caller decides whether pending accounts may sign in.
    #[must_use]
    pub fn verify_credentials(&self, email: &str, password: &str) -> Option<UserSnapshot> {
        let users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        let user = users.get(email)?;
        (user.password == password).then(|| UserSnapshot {
            id: user.id,
            email: email.to_string(),
            confirmed: user.confirmed,
            created_at: user.created_at,
        })
    }

    /// Mark an account's email as confirmed, as the confirmation link would.
    pub fn confirm_email(&self, email: &str) -> bool {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        match users.get_mut(email) {
            Some(user) => {
                user.confirmed = true;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn user_by_id(&self, id: Uuid) -> Option<UserSnapshot> {
        let users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        users.iter().find(|(_, user)| user.id == id).map(|(email, user)| UserSnapshot {
            id: user.id,
            email: email.clone(),
            confirmed: user.confirmed,
            created_at: user.created_at,
        })
    }

    /// Mint an access and refresh token pair for `user_id`.
    pub fn issue_session(&self, user_id: Uuid) -> IssuedSession {
        let access_token = format!("at-{}", Uuid::new_v4().simple());
        let refresh_token = format!("rt-{}", Uuid::new_v4().simple());
        let expires_at = Utc::now() + TimeDelta::seconds(SESSION_TTL_SECONDS);

        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                access_token.clone(),
                StoredSession {
                    user_id,
                    expires_at,
                },
            );
        self.refresh_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(refresh_token.clone(), user_id);

        IssuedSession {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Redeem a refresh token. Tokens rotate: each one works exactly once.
    pub fn consume_refresh(&self, token: &str) -> Option<Uuid> {
        self.refresh_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
    }

    /// Resolve a bearer token to its account, if the session is still live.
    #[must_use]
    pub fn resolve_bearer(&self, token: &str) -> Option<Uuid> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let session = sessions.get(token)?;
        (session.expires_at > Utc::now()).then_some(session.user_id)
    }

    pub fn revoke_session(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    /// Drop every session and refresh token, as a server-side revocation
    /// sweep would.
    pub fn revoke_all_sessions(&self) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.refresh_tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn profile(&self, id: Uuid) -> Option<ProfileRecord> {
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Merge the provided fields into the profile row, creating it on first
    /// write. Absent fields keep their stored values.
    pub fn merge_profile(
        &self,
        id: Uuid,
        username: Option<String>,
        updated_at: Option<DateTime<Utc>>,
    ) -> ProfileRecord {
        let mut profiles = self.profiles.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = profiles.entry(id).or_insert_with(|| ProfileRecord {
            id,
            username: None,
            updated_at: None,
        });
        if let Some(username) = username {
            entry.username = Some(username);
        }
        if let Some(updated_at) = updated_at {
            entry.updated_at = Some(updated_at);
        }
        entry.clone()
    }

    pub(crate) fn count_signup(&self) {
        self.signup_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn count_token(&self) {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn count_recover(&self) {
        self.recover_calls.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn count_profile_select(&self) {
        self.profile_selects.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn count_profile_upsert(&self) {
        self.profile_upserts.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn signup_calls(&self) -> usize {
        self.signup_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn recover_calls(&self) -> usize {
        self.recover_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn profile_selects(&self) -> usize {
        self.profile_selects.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn profile_upserts(&self) -> usize {
        self.profile_upserts.load(Ordering::SeqCst)
    }
}
