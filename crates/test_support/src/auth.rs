//! Identity endpoints of the stub backend.
//!
//! Error bodies mirror the production wire shapes: `{"error_code", "msg"}`
//! from the account endpoints and OAuth-style `{"error",
//! "error_description"}` from the token endpoint.

use crate::state::{BackendState, SESSION_TTL_SECONDS, UserSnapshot};
use crate::{bearer_token, require_api_key};
use axum::{
    Json,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

const MIN_PASSWORD_CHARS: usize = 6;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GrantQuery {
    pub grant_type: String,
}

pub async fn signup(
    Extension(state): Extension<Arc<BackendState>>,
    headers: HeaderMap,
    Json(credentials): Json<Credentials>,
) -> ApiResult {
    require_api_key(&headers)?;
    state.count_signup();

    if credentials.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(unprocessable(
            "weak_password",
            "Password should be at least 6 characters",
        ));
    }

    let confirmed = state.auto_confirm();
    let Some(user) = state.create_user(&credentials.email, &credentials.password, confirmed)
    else {
        return Err(unprocessable("user_already_exists", "User already registered"));
    };

    debug!("registered {} (confirmed: {confirmed})", user.email);
    if confirmed {
        Ok(Json(grant_body(&state, &user)))
    } else {
        Ok(Json(user_body(&user)))
    }
}

pub async fn token(
    Extension(state): Extension<Arc<BackendState>>,
    Query(query): Query<GrantQuery>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    require_api_key(&headers)?;
    state.count_token();

    match query.grant_type.as_str() {
        "password" => password_grant(&state, &body),
        "refresh_token" => refresh_grant(&state, &body),
        other => Err(bad_grant(&format!("unsupported grant type {other}"))),
    }
}

pub async fn logout(
    Extension(state): Extension<Arc<BackendState>>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    require_api_key(&headers)?;

    match bearer_token(&headers) {
        Some(token) if state.revoke_session(token) => Ok(StatusCode::NO_CONTENT),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error_code": "session_not_found",
                "msg": "Session from session_id claim in JWT does not exist"
            })),
        )),
    }
}

pub async fn recover(
    Extension(state): Extension<Arc<BackendState>>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> ApiResult {
    require_api_key(&headers)?;
    state.count_recover();

    // Same answer whether or not the address is registered.
    Ok(Json(json!({})))
}

pub async fn user(
    Extension(state): Extension<Arc<BackendState>>,
    headers: HeaderMap,
) -> ApiResult {
    require_api_key(&headers)?;

    let user = bearer_token(&headers)
        .and_then(|token| state.resolve_bearer(token))
        .and_then(|id| state.user_by_id(id));
    match user {
        Some(user) => Ok(Json(user_body(&user))),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error_code": "bad_jwt",
                "msg": "invalid JWT: unable to parse or verify signature"
            })),
        )),
    }
}

fn password_grant(state: &BackendState, body: &Value) -> ApiResult {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let Some(user) = state.verify_credentials(email, password) else {
        return Err(bad_grant("Invalid login credentials"));
    };
    if !user.confirmed {
        return Err(bad_grant("Email not confirmed"));
    }
    Ok(Json(grant_body(state, &user)))
}

fn refresh_grant(state: &BackendState, body: &Value) -> ApiResult {
    let token = body
        .get("refresh_token")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let Some(user_id) = state.consume_refresh(token) else {
        return Err(bad_grant("Invalid Refresh Token: Refresh Token Not Found"));
    };
    let Some(user) = state.user_by_id(user_id) else {
        return Err(bad_grant("Invalid Refresh Token: user no longer exists"));
    };
    Ok(Json(grant_body(state, &user)))
}

fn grant_body(state: &BackendState, user: &UserSnapshot) -> Value {
    let issued = state.issue_session(user.id);
    json!({
        "access_token": issued.access_token,
        "token_type": "bearer",
        "expires_in": SESSION_TTL_SECONDS,
        "expires_at": issued.expires_at.timestamp(),
        "refresh_token": issued.refresh_token,
        "user": user_body(user),
    })
}

fn user_body(user: &UserSnapshot) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "email_confirmed_at": user.confirmed.then_some(user.created_at),
        "created_at": user.created_at,
    })
}

fn unprocessable(code: &str, msg: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error_code": code, "msg": msg })),
    )
}

fn bad_grant(description: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_grant", "error_description": description })),
    )
}
