//! Profile reads and writes.
//!
//! Reads go through a per-identity freshness cache so repeated visits to the
//! settings page do not refetch the same row. Writes are merge-upserts that
//! stamp `updated_at` and drop the cache entry, so the next read observes the
//! stored row.
//!
//! Read failures degrade to `None` with a warning and the page renders
//! without profile data. Write failures surface to the caller for display.

use crate::auth::AuthClient;
use crate::error::Error;
use crate::transport::Transport;
use crate::types::{Profile, ProfileChanges, ProfileUpsert};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;
use uuid::Uuid;

/// How long a fetched profile row stays fresh.
const PROFILE_FRESH_FOR: TimeDelta = TimeDelta::minutes(5);

struct CachedProfile {
    profile: Profile,
    fetched_at: DateTime<Utc>,
}

pub struct ProfileStore {
    auth: Arc<AuthClient>,
    transport: Arc<Transport>,
    cache: Mutex<HashMap<Uuid, CachedProfile>>,
    fresh_for: TimeDelta,
}

impl ProfileStore {
    pub(crate) fn new(auth: Arc<AuthClient>, transport: Arc<Transport>) -> Self {
        Self {
            auth,
            transport,
            cache: Mutex::new(HashMap::new()),
            fresh_for: PROFILE_FRESH_FOR,
        }
    }

    #[must_use]
    pub(crate) fn with_fresh_for(mut self, fresh_for: TimeDelta) -> Self {
        self.fresh_for = fresh_for;
        self
    }

    /// Profile of the signed-in account, from cache when fresh.
    ///
    /// An account without a profile row yet resolves to an empty profile
    /// carrying only the id, so forms have something to edit. Any failure
    /// resolves to `None` after logging; pages render without profile data
    /// rather than breaking.
    pub async fn get_profile(&self) -> Option<Profile> {
        let user = match self.auth.get_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("No user logged in");
                return None;
            }
            Err(err) => {
                warn!("Failed to load profile: {err}");
                return None;
            }
        };

        if let Some(profile) = self.cached(user.id) {
            return Some(profile);
        }

        let token = match self.auth.get_session().await {
            Ok(Some(session)) => session.access_token,
            Ok(None) => {
                warn!("No user logged in");
                return None;
            }
            Err(err) => {
                warn!("Failed to load profile: {err}");
                return None;
            }
        };

        match self.transport.select_profile(&token, user.id).await {
            Ok(Some(profile)) => {
                self.remember(profile.clone());
                Some(profile)
            }
            Ok(None) => {
                let profile = Profile::only_id(user.id);
                self.remember(profile.clone());
                Some(profile)
            }
            Err(err) => {
                warn!("Failed to load profile: {err}");
                None
            }
        }
    }

    /// Merge `changes` into the stored profile and return the stored row.
    ///
    /// Stamps `updated_at` and invalidates the cache entry on success. An
    /// empty change set writes nothing and answers with the current profile.
    ///
    /// # Errors
    /// Returns [`Error::NotSignedIn`] without a signed-in account, backend
    /// rejections verbatim, and transport failures.
    pub async fn update_profile(&self, changes: &ProfileChanges) -> Result<Profile, Error> {
        let Some(user) = self.auth.get_user().await? else {
            return Err(Error::NotSignedIn);
        };

        if changes.is_empty() {
            return Ok(self
                .get_profile()
                .await
                .unwrap_or_else(|| Profile::only_id(user.id)));
        }

        let Some(session) = self.auth.get_session().await? else {
            return Err(Error::NotSignedIn);
        };

        let record = ProfileUpsert {
            id: user.id,
            username: changes.username.clone(),
            updated_at: Utc::now(),
        };
        let stored = self
            .transport
            .upsert_profile(&session.access_token, &record)
            .await?;

        self.invalidate(user.id);
        Ok(stored)
    }

    fn cached(&self, id: Uuid) -> Option<Profile> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(&id).and_then(|entry| {
            (Utc::now() - entry.fetched_at < self.fresh_for).then(|| entry.profile.clone())
        })
    }

    fn remember(&self, profile: Profile) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.insert(
            profile.id,
            CachedProfile {
                profile,
                fetched_at: Utc::now(),
            },
        );
    }

    fn invalidate(&self, id: Uuid) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.remove(&id);
    }
}
