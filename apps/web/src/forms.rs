//! Local checks for the auth forms.
//!
//! These run before any request leaves the browser and only catch obvious
//! mistakes. Account policy (password strength, duplicate emails) is enforced
//! by the backend and its messages are shown verbatim by the pages.

use konto_client::{AuthResponse, Client};

/// Delay before the signup page forwards a pending account to the login form.
pub(crate) const CONFIRMATION_REDIRECT_DELAY_MS: u32 = 3_000;

pub(crate) const PENDING_CONFIRMATION_MESSAGE: &str =
    "Sign up successful! Please check your email to confirm your account before logging in.";

/// Shown after every reset request, whether or not the address is registered.
pub(crate) const RESET_SENT_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// What the signup page should do after a successful request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SignupOutcome {
    /// The backend issued a session right away.
    SignedIn,
    /// The account was created but needs email confirmation first.
    ConfirmationPending,
}

pub(crate) fn signup_outcome(response: &AuthResponse) -> SignupOutcome {
    if response.session.is_some() {
        SignupOutcome::SignedIn
    } else {
        SignupOutcome::ConfirmationPending
    }
}

pub(crate) fn validate_login(email: &str, password: &str) -> Result<(), String> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Err("Email and password are required.".to_string());
    }
    Ok(())
}

pub(crate) fn validate_signup(email: &str, password: &str, confirm: &str) -> Result<(), String> {
    if email.trim().is_empty() || password.trim().is_empty() || confirm.trim().is_empty() {
        return Err("All fields are required.".to_string());
    }
    if !email.contains('@') {
        return Err("Email address looks invalid.".to_string());
    }
    if password != confirm {
        return Err("Passwords do not match.".to_string());
    }
    Ok(())
}

/// Runs the local signup checks and only then asks the backend to create the
/// account. A rejected form never produces a request.
pub(crate) async fn submit_signup(
    client: &Client,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<AuthResponse, String> {
    validate_signup(email, password, confirm)?;
    client
        .auth()
        .sign_up(email, password)
        .await
        .map_err(|err| err.to_string())
}

pub(crate) fn validate_reset(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required.".to_string());
    }
    if !email.contains('@') {
        return Err("Email address looks invalid.".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        SignupOutcome, signup_outcome, submit_signup, validate_login, validate_reset,
        validate_signup,
    };
    use anyhow::Result;
    use chrono::{TimeDelta, Utc};
    use konto_client::{AuthResponse, Client, Config, Session, User};
    use test_support::{API_KEY, StubBackend, init_tracing};
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::from_u128(7),
            email: "ana@example.com".to_string(),
            email_confirmed_at: Some(Utc::now()),
            created_at: Some(Utc::now()),
        }
    }

    fn session() -> Session {
        Session {
            access_token: "at-test".to_string(),
            refresh_token: "rt-test".to_string(),
            token_type: "bearer".to_string(),
            expires_at: Utc::now() + TimeDelta::hours(1),
            user: user(),
        }
    }

    #[test]
    fn signup_outcome_follows_session_presence() {
        let signed_in = AuthResponse {
            user: user(),
            session: Some(session()),
        };
        assert_eq!(signup_outcome(&signed_in), SignupOutcome::SignedIn);

        let pending = AuthResponse {
            user: user(),
            session: None,
        };
        assert_eq!(signup_outcome(&pending), SignupOutcome::ConfirmationPending);
    }

    #[test]
    fn login_requires_both_fields() {
        assert!(validate_login("", "secret1").is_err());
        assert!(validate_login("ana@example.com", "   ").is_err());
        assert!(validate_login("ana@example.com", "secret1").is_ok());
    }

    #[test]
    fn signup_rejects_incomplete_or_mismatched_input() {
        assert_eq!(
            validate_signup("", "secret1", "secret1"),
            Err("All fields are required.".to_string())
        );
        assert_eq!(
            validate_signup("ana.example.com", "secret1", "secret1"),
            Err("Email address looks invalid.".to_string())
        );
        assert_eq!(
            validate_signup("ana@example.com", "secret1", "secret2"),
            Err("Passwords do not match.".to_string())
        );
        assert!(validate_signup("ana@example.com", "secret1", "secret1").is_ok());
    }

    #[tokio::test]
    async fn mismatched_confirmation_never_reaches_the_backend() -> Result<()> {
        init_tracing();
        let backend = StubBackend::spawn().await?;
        let client = Client::new(Config::new(backend.url(), API_KEY)?)?;

        let err = submit_signup(&client, "ana@example.com", "secret1", "secret2")
            .await
            .expect_err("mismatched confirmation should fail locally");
        assert_eq!(err, "Passwords do not match.");
        assert_eq!(backend.state().signup_calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn valid_signup_reaches_the_backend_once() -> Result<()> {
        init_tracing();
        let backend = StubBackend::spawn().await?;
        let client = Client::new(Config::new(backend.url(), API_KEY)?)?;

        let response = submit_signup(&client, "ana@example.com", "secret1", "secret1")
            .await
            .expect("signup should be forwarded");
        assert_eq!(signup_outcome(&response), SignupOutcome::ConfirmationPending);
        assert_eq!(backend.state().signup_calls(), 1);
        Ok(())
    }

    #[test]
    fn reset_requires_a_plausible_email() {
        assert_eq!(validate_reset("  "), Err("Email is required.".to_string()));
        assert_eq!(
            validate_reset("ana.example.com"),
            Err("Email address looks invalid.".to_string())
        );
        assert!(validate_reset("ana@example.com").is_ok());
    }
}
