//! Pluggable persistence for the current session.
//!
//! The auth client keeps the session in memory and mirrors it through a
//! `SessionCache` so a page reload can restore it. Browser deployments plug
//! in local storage; native callers usually keep `NoPersistence` or use
//! `MemoryCache` in tests. Storage is advisory: implementations swallow their
//! own failures rather than turning persistence problems into auth errors.

use crate::types::Session;
use std::sync::{Mutex, PoisonError};

pub trait SessionCache: Send + Sync {
    /// Returns the persisted session, if any.
    fn load(&self) -> Option<Session>;
    /// Persists the session, replacing any previous one.
    fn store(&self, session: &Session);
    /// Removes the persisted session.
    fn clear(&self);
}

/// Keeps nothing; every run starts signed out.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPersistence;

impl SessionCache for NoPersistence {
    fn load(&self) -> Option<Session> {
        None
    }

    fn store(&self, _session: &Session) {}

    fn clear(&self) {}
}

/// In-memory cache, used by tests and long-lived native processes.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<Session>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out already holding a session, as after a previous run.
    #[must_use]
    pub fn preloaded(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionCache for MemoryCache {
    fn load(&self) -> Option<Session> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, session: &Session) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
