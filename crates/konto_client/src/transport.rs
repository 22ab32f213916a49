//! HTTP transport for the auth and profile endpoints.
//!
//! All remote calls go through here so request construction, header handling,
//! and error decoding stay in one place. Non-success responses are decoded
//! into [`ApiError`] values that carry the backend message verbatim; transport
//! failures map to [`Error::Network`] or [`Error::Timeout`]. Callers decide
//! what to do with the result; nothing in this module touches session state.

use crate::config::Config;
use crate::error::{ApiError, Error};
use crate::types::{AuthResponse, Profile, ProfileUpsert, Session, User};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

pub(crate) const APP_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Header carrying the public API key on every request.
const API_KEY_HEADER: &str = "apikey";
/// Upsert semantics for profile writes: merge on conflict, return the row.
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=representation";
/// Maximum number of error body characters surfaced when the body is not JSON.
const MAX_ERROR_CHARS: usize = 200;

#[cfg(not(target_arch = "wasm32"))]
const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
#[cfg(not(target_arch = "wasm32"))]
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Thin wrapper around a shared `reqwest::Client` bound to one backend.
#[derive(Clone, Debug)]
pub(crate) struct Transport {
    http: reqwest::Client,
    config: Config,
}

impl Transport {
    /// Build a transport for the configured backend.
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub(crate) fn new(config: Config) -> Result<Self, Error> {
        Ok(Self {
            http: build_http_client()?,
            config,
        })
    }

    /// Register a new account. The response carries a session when the
    /// backend auto-confirms email addresses, and only the pending user
    /// record otherwise.
    pub(crate) async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let url = self.config.auth_endpoint("signup");
        debug!("auth request: POST {url}");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(decode_api_error(status.as_u16(), &body)));
        }

        let body = response.text().await.map_err(map_transport_error)?;
        decode_sign_up(&body)
    }

    /// Exchange credentials for a session.
    pub(crate) async fn password_grant(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, Error> {
        let url = format!("{}?grant_type=password", self.config.auth_endpoint("token"));
        debug!("auth request: POST {url}");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let grant: GrantResponse = read_json(response).await?;
        Ok(grant.into_session())
    }

    /// Exchange a refresh token for a fresh session.
    pub(crate) async fn refresh_grant(&self, refresh_token: &str) -> Result<Session, Error> {
        let url = format!(
            "{}?grant_type=refresh_token",
            self.config.auth_endpoint("token")
        );
        debug!("auth request: POST {url}");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key())
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let grant: GrantResponse = read_json(response).await?;
        Ok(grant.into_session())
    }

    /// Revoke the session behind `access_token`.
    pub(crate) async fn logout(&self, access_token: &str) -> Result<(), Error> {
        let url = self.config.auth_endpoint("logout");
        debug!("auth request: POST {url}");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_transport_error)?;

        read_empty(response).await
    }

    /// Request a password reset email. The backend answers 200 whether or not
    /// the address is registered.
    pub(crate) async fn recover(&self, email: &str, redirect_to: Option<&str>) -> Result<(), Error> {
        let mut url = self.config.auth_endpoint("recover");
        if let Some(target) = redirect_to {
            url = format!("{url}?redirect_to={}", urlencoding::encode(target));
        }
        debug!("auth request: POST {url}");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key())
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(map_transport_error)?;

        read_empty(response).await
    }

    /// Fetch the user record behind `access_token`.
    pub(crate) async fn user(&self, access_token: &str) -> Result<User, Error> {
        let url = self.config.auth_endpoint("user");
        debug!("auth request: GET {url}");
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_transport_error)?;

        read_json(response).await
    }

    /// Read one profile row by id. Row-level security hides rows the caller
    /// does not own, so a missing row and a foreign row both come back `None`.
    pub(crate) async fn select_profile(
        &self,
        access_token: &str,
        id: Uuid,
    ) -> Result<Option<Profile>, Error> {
        let url = format!("{}?id=eq.{id}&select=*", self.config.rest_endpoint("profiles"));
        debug!("rest request: GET {url}");
        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_transport_error)?;

        let rows: Vec<Profile> = read_json(response).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert-or-merge a profile row and return the stored representation.
    pub(crate) async fn upsert_profile(
        &self,
        access_token: &str,
        record: &ProfileUpsert,
    ) -> Result<Profile, Error> {
        let url = self.config.rest_endpoint("profiles");
        debug!("rest request: POST {url}");
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key())
            .header("Prefer", UPSERT_PREFER)
            .bearer_auth(access_token)
            .json(record)
            .send()
            .await
            .map_err(map_transport_error)?;

        let rows: Vec<Profile> = read_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Decode("Upsert returned no rows".to_string()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_http_client() -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .user_agent(APP_USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))
}

// Browsers own timeouts and the user agent; the builder options above do not
// exist on this target.
#[cfg(target_arch = "wasm32")]
fn build_http_client() -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::new())
}

/// Token grant payload shared by the signup, password, and refresh endpoints.
#[derive(Debug, Deserialize)]
struct GrantResponse {
    access_token: String,
    token_type: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    refresh_token: String,
    user: User,
}

impl GrantResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| Utc::now() + TimeDelta::seconds(self.expires_in));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            expires_at,
            user: self.user,
        }
    }
}

fn decode_sign_up(body: &str) -> Result<AuthResponse, Error> {
    if let Ok(grant) = serde_json::from_str::<GrantResponse>(body) {
        let session = grant.into_session();
        return Ok(AuthResponse {
            user: session.user.clone(),
            session: Some(session),
        });
    }
    serde_json::from_str::<User>(body)
        .map(|user| AuthResponse {
            user,
            session: None,
        })
        .map_err(|err| Error::Decode(format!("Failed to decode response: {err}")))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Api(decode_api_error(status.as_u16(), &body)));
    }
    response
        .json::<T>()
        .await
        .map_err(|err| Error::Decode(format!("Failed to decode response: {err}")))
}

async fn read_empty(response: reqwest::Response) -> Result<(), Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api(decode_api_error(status.as_u16(), &body)))
}

/// Decode an error body into an [`ApiError`].
///
/// The auth endpoints answer with `{"error_code", "msg"}`, the token endpoint
/// with OAuth-style `{"error", "error_description"}`, and the profile
/// endpoints with `{"code", "message"}`. The first matching key wins; bodies
/// that are not JSON fall back to the sanitized raw text.
fn decode_api_error(status: u16, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(extract_message)
        .unwrap_or_else(|| sanitize_body(body));
    let code = parsed.as_ref().and_then(extract_code);
    ApiError {
        status,
        code,
        message,
    }
}

fn extract_message(body: &Value) -> Option<String> {
    ["msg", "message", "error_description"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

fn extract_code(body: &Value) -> Option<String> {
    ["error_code", "code", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Sanitizes non-JSON error bodies for user-facing messages by trimming and
/// truncating.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

fn map_transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else {
        Error::Network(err.to_string())
    }
}
