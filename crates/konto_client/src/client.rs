//! Composition root tying the auth facade, session store, and profile store
//! to one backend. Build one `Client` at startup and share it.

use crate::auth::AuthClient;
use crate::config::Config;
use crate::error::Error;
use crate::profile::ProfileStore;
use crate::session::SessionStore;
use crate::storage::{NoPersistence, SessionCache};
use crate::transport::Transport;
use chrono::TimeDelta;
use std::sync::Arc;

pub struct Client {
    transport: Arc<Transport>,
    auth: Arc<AuthClient>,
    session: Arc<SessionStore>,
    profiles: Arc<ProfileStore>,
}

impl Client {
    /// Build a client without session persistence.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: Config) -> Result<Self, Error> {
        Self::with_cache(config, Arc::new(NoPersistence))
    }

    /// Build a client that persists sessions in `cache`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_cache(config: Config, cache: Arc<dyn SessionCache>) -> Result<Self, Error> {
        let transport = Arc::new(Transport::new(config)?);
        let auth = Arc::new(AuthClient::new(Arc::clone(&transport), cache));
        let session = Arc::new(SessionStore::new(&auth));
        let profiles = Arc::new(ProfileStore::new(Arc::clone(&auth), Arc::clone(&transport)));
        Ok(Self {
            transport,
            auth,
            session,
            profiles,
        })
    }

    /// Override how long profile reads stay fresh. The default suits
    /// interactive use.
    #[must_use]
    pub fn with_profile_ttl(mut self, fresh_for: TimeDelta) -> Self {
        self.profiles = Arc::new(
            ProfileStore::new(Arc::clone(&self.auth), Arc::clone(&self.transport))
                .with_fresh_for(fresh_for),
        );
        self
    }

    /// Resolve the session store's initial state from storage. Call once at
    /// startup; auth notifications keep the store current afterwards.
    pub async fn bootstrap(&self) {
        let fetched = self.auth.get_session().await;
        self.session.resolve_initial(fetched);
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<AuthClient> {
        &self.auth
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn profiles(&self) -> &Arc<ProfileStore> {
        &self.profiles
    }
}
