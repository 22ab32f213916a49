//! Browser-backed session persistence.
//!
//! Sessions are mirrored into local storage so a reload can restore them
//! without a fresh login. Storage failures (private browsing, quota) are
//! swallowed; the worst case is starting signed out.

use konto_client::{Session, SessionCache};

const STORAGE_KEY: &str = "konto.session";

pub struct LocalStorageCache;

impl LocalStorageCache {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok()).flatten()
    }
}

impl SessionCache for LocalStorageCache {
    fn load(&self) -> Option<Session> {
        let raw = Self::storage()?.get_item(STORAGE_KEY).ok()??;
        serde_json::from_str(&raw).ok()
    }

    fn store(&self, session: &Session) {
        let Some(storage) = Self::storage() else {
            return;
        };
        if let Ok(raw) = serde_json::to_string(session) {
            let _ = storage.set_item(STORAGE_KEY, &raw);
        }
    }

    fn clear(&self) {
        let Some(storage) = Self::storage() else {
            return;
        };
        let _ = storage.remove_item(STORAGE_KEY);
    }
}
