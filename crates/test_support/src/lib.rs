pub mod server;
pub mod state;

mod auth;
mod rest;

pub use server::{API_KEY, StubBackend};
pub use state::BackendState;

use axum::Json;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use serde_json::{Value, json};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a tracing subscriber for tests. Safe to call repeatedly.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub(crate) fn require_api_key(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let provided = headers.get("apikey").and_then(|value| value.to_str().ok());
    if provided == Some(API_KEY) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error_code": "invalid_api_key", "msg": "Invalid API key" })),
        ))
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
