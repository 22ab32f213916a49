//! Profile table endpoints of the stub backend.
//!
//! Row-level security is modelled the way the real database enforces it:
//! selects silently hide rows the caller does not own, writes to foreign rows
//! fail with the `42501` policy violation.

use crate::state::{BackendState, ProfileRecord};
use crate::{bearer_token, require_api_key};
use axum::{
    Json,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfilePayload {
    pub id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

pub async fn select_profiles(
    Extension(state): Extension<Arc<BackendState>>,
    Query(query): Query<ProfileQuery>,
    headers: HeaderMap,
) -> ApiResult {
    require_api_key(&headers)?;
    state.count_profile_select();

    let Some(caller) = bearer_token(&headers).and_then(|token| state.resolve_bearer(token))
    else {
        return Err(expired_jwt());
    };

    let target = query.id.as_deref().and_then(parse_eq_filter);
    let rows: Vec<Value> = match target {
        Some(id) if id == caller => state
            .profile(id)
            .map(|profile| profile_body(&profile))
            .into_iter()
            .collect(),
        _ => Vec::new(),
    };
    Ok(Json(Value::Array(rows)))
}

pub async fn upsert_profile(
    Extension(state): Extension<Arc<BackendState>>,
    headers: HeaderMap,
    Json(payload): Json<ProfilePayload>,
) -> ApiResult {
    require_api_key(&headers)?;
    state.count_profile_upsert();

    let Some(caller) = bearer_token(&headers).and_then(|token| state.resolve_bearer(token))
    else {
        return Err(expired_jwt());
    };
    if payload.id != caller {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "code": "42501",
                "message": "new row violates row-level security policy for table \"profiles\""
            })),
        ));
    }

    let stored = state.merge_profile(payload.id, payload.username, payload.updated_at);
    Ok(Json(Value::Array(vec![profile_body(&stored)])))
}

fn parse_eq_filter(raw: &str) -> Option<Uuid> {
    raw.strip_prefix("eq.")?.parse().ok()
}

fn profile_body(profile: &ProfileRecord) -> Value {
    json!({
        "id": profile.id,
        "username": profile.username,
        "updated_at": profile.updated_at,
    })
}

fn expired_jwt() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "code": "PGRST301", "message": "JWT expired" })),
    )
}
