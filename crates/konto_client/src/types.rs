//! Wire types shared across the auth and profile surfaces.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sessions within this window of their expiry are treated as expired so a
/// refresh happens before the backend starts rejecting the token.
const EXPIRY_MARGIN_SECONDS: i64 = 30;

/// The authenticated identity as reported by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A bearer session issued by the backend.
///
/// Never constructed locally; always decoded from a token grant and replaced
/// wholesale on every auth change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl Session {
    /// Whether the access token is past (or within the margin of) its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + Duration::seconds(EXPIRY_MARGIN_SECONDS)
    }
}

/// Outcome of `sign_up` and `sign_in_with_password`.
///
/// `session` is `None` when the account was created but the deployment
/// requires email confirmation before a session is issued.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthResponse {
    pub user: User,
    pub session: Option<Session>,
}

/// Auth change notifications, delivered to subscribers in emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// The profile row tied to an identity.
///
/// A user who has not saved their settings yet has no row; reads then yield a
/// profile carrying only the id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// The "not yet created" placeholder for an identity without a row.
    #[must_use]
    pub fn only_id(id: Uuid) -> Self {
        Self {
            id,
            username: None,
            updated_at: None,
        }
    }
}

/// Partial profile update; unset fields are left untouched by the upsert.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileChanges {
    pub username: Option<String>,
}

impl ProfileChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
    }
}

/// Upsert payload: the changed fields plus the row key and a fresh timestamp.
#[derive(Debug, Serialize)]
pub(crate) struct ProfileUpsert {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{Duration, Profile, ProfileChanges, Session, User, Utc};
    use uuid::Uuid;

    fn session(expires_in_seconds: i64) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "bearer".to_string(),
            expires_at: Utc::now() + Duration::seconds(expires_in_seconds),
            user: User {
                id: Uuid::nil(),
                email: "alice@example.com".to_string(),
                email_confirmed_at: None,
                created_at: None,
            },
        }
    }

    #[test]
    fn session_expiry_includes_margin() {
        let now = Utc::now();
        assert!(session(-10).is_expired(now));
        assert!(session(10).is_expired(now), "inside the refresh margin");
        assert!(!session(3600).is_expired(now));
    }

    #[test]
    fn empty_changes_are_detected() {
        assert!(ProfileChanges::default().is_empty());
        assert!(!ProfileChanges {
            username: Some("ada".to_string()),
        }
        .is_empty());
    }

    #[test]
    fn only_id_profile_has_no_fields_set() {
        let id = Uuid::from_u128(7);
        let profile = Profile::only_id(id);
        assert_eq!(profile.id, id);
        assert!(profile.username.is_none());
        assert!(profile.updated_at.is_none());
    }
}
