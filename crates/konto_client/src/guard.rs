//! Route guard decisions.
//!
//! The guard is a pure function from session state to a rendering decision,
//! so the UI layer stays free of auth conditionals and the rules stay
//! testable off the main thread. It gates rendering only; real access
//! control lives in the backend's row-level security.

use crate::session::AuthSessionState;

pub const LOGIN_PATH: &str = "/login";

/// What a protected route should do right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session state is still unknown; render a placeholder, not a redirect.
    Loading,
    /// Signed in; render the protected content.
    Render,
    /// Signed out; send the visitor to login, remembering where they were
    /// headed.
    RedirectToLogin { from: String },
}

#[must_use]
pub fn evaluate(state: &AuthSessionState, path: &str) -> RouteDecision {
    match state {
        AuthSessionState::Initializing => RouteDecision::Loading,
        AuthSessionState::Authenticated(_) => RouteDecision::Render,
        AuthSessionState::Unauthenticated => RouteDecision::RedirectToLogin {
            from: path.to_string(),
        },
    }
}

/// Login URL carrying the interrupted destination as a query parameter.
#[must_use]
pub fn login_path_for(from: &str) -> String {
    format!("{LOGIN_PATH}?from={}", urlencoding::encode(from))
}

/// Destination to return to after login.
///
/// Only absolute in-app paths are accepted; schemes, protocol-relative
/// URLs, and anything else fall back to the dashboard so the login page
/// cannot be used as an open redirect.
#[must_use]
pub fn return_target(from: Option<&str>) -> String {
    match from {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
