use std::fmt;
use thiserror::Error;

/// Failures surfaced by the client.
///
/// Expected backend rejections (bad credentials, policy violations) arrive as
/// `Error::Api` carrying the backend's own message; transport problems map to
/// `Network` or `Timeout`. Variants hold owned strings so results stay `Clone`
/// for UI state.
#[derive(Clone, Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Unable to reach the server: {0}")]
    Network(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Api(ApiError),
    #[error("Response error: {0}")]
    Decode(String),
    #[error("User not logged in")]
    NotSignedIn,
}

/// An error body returned by the backend, kept verbatim.
///
/// `message` is displayed exactly as the backend wrote it; `code` is the
/// machine-readable error code when one was present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl Error {
    /// Returns the backend error when this is an API rejection.
    #[must_use]
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, Error};

    #[test]
    fn api_error_displays_backend_message_verbatim() {
        let err = Error::Api(ApiError {
            status: 400,
            code: Some("invalid_credentials".to_string()),
            message: "Invalid login credentials".to_string(),
        });
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn as_api_exposes_status_and_code() {
        let err = Error::Api(ApiError {
            status: 422,
            code: Some("weak_password".to_string()),
            message: "Password should be at least 6 characters".to_string(),
        });
        let api = err.as_api().unwrap();
        assert_eq!(api.status, 422);
        assert_eq!(api.code.as_deref(), Some("weak_password"));

        assert!(Error::NotSignedIn.as_api().is_none());
    }
}
