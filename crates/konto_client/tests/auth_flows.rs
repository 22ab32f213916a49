#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end auth flows against the stub backend.

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use konto_client::{
    AuthEvent, AuthSessionState, AuthSubscription, Client, Config, Error, MemoryCache, Session,
    SessionCache, User,
};
use std::sync::{Arc, Mutex};
use test_support::{API_KEY, StubBackend, init_tracing};

fn client_for(backend: &StubBackend) -> Result<Client> {
    Ok(Client::new(Config::new(backend.url(), API_KEY)?)?)
}

fn record_events(client: &Client) -> (Arc<Mutex<Vec<AuthEvent>>>, AuthSubscription) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let subscription = client
        .auth()
        .on_auth_state_change(move |event, _| sink.lock().expect("lock").push(event));
    (events, subscription)
}

fn expired_copy(access_token: &str, refresh_token: &str, user_id: uuid::Uuid) -> Session {
    Session {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        token_type: "bearer".to_string(),
        expires_at: Utc::now() - TimeDelta::minutes(5),
        user: User {
            id: user_id,
            email: "ana@example.com".to_string(),
            email_confirmed_at: None,
            created_at: None,
        },
    }
}

#[tokio::test]
async fn sign_in_authenticates_and_notifies() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;
    backend
        .state()
        .create_user("ana@example.com", "secret1", true)
        .context("seed ana")?;

    let client = client_for(&backend)?;
    client.bootstrap().await;
    let (events, _sub) = record_events(&client);

    let response = client
        .auth()
        .sign_in_with_password("ana@example.com", "secret1")
        .await?;
    assert_eq!(response.user.email, "ana@example.com");
    let issued = response.session.context("sign-in should carry a session")?;
    let stored = client.session().state();
    assert_eq!(stored.session(), Some(&issued));
    assert_eq!(*events.lock().expect("lock"), vec![AuthEvent::SignedIn]);
    assert_eq!(backend.state().token_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn wrong_password_surfaces_backend_message() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;
    backend
        .state()
        .create_user("ana@example.com", "secret1", true)
        .context("seed ana")?;

    let client = client_for(&backend)?;
    client.bootstrap().await;

    let err = client
        .auth()
        .sign_in_with_password("ana@example.com", "wrong99")
        .await
        .expect_err("bad credentials should be rejected");
    let api = err.as_api().context("should be an API error")?;
    assert_eq!(api.status, 400);
    assert_eq!(api.message, "Invalid login credentials");
    assert_eq!(err.to_string(), "Invalid login credentials");
    assert_eq!(client.session().state(), AuthSessionState::Unauthenticated);
    Ok(())
}

#[tokio::test]
async fn auto_confirmed_signup_signs_in_immediately() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;
    backend.state().set_auto_confirm(true);

    let client = client_for(&backend)?;
    client.bootstrap().await;
    let (events, _sub) = record_events(&client);

    let response = client.auth().sign_up("ana@example.com", "secret1").await?;
    assert!(response.session.is_some());
    assert!(client.session().state().is_authenticated());
    assert_eq!(*events.lock().expect("lock"), vec![AuthEvent::SignedIn]);
    Ok(())
}

#[tokio::test]
async fn pending_signup_stays_signed_out_until_confirmed() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;

    let client = client_for(&backend)?;
    client.bootstrap().await;

    let response = client.auth().sign_up("ana@example.com", "secret1").await?;
    assert!(response.session.is_none());
    assert_eq!(response.user.email, "ana@example.com");
    assert_eq!(client.session().state(), AuthSessionState::Unauthenticated);

    let err = client
        .auth()
        .sign_in_with_password("ana@example.com", "secret1")
        .await
        .expect_err("unconfirmed account should not sign in");
    assert_eq!(err.to_string(), "Email not confirmed");

    assert!(backend.state().confirm_email("ana@example.com"));
    client
        .auth()
        .sign_in_with_password("ana@example.com", "secret1")
        .await?;
    assert!(client.session().state().is_authenticated());
    Ok(())
}

#[tokio::test]
async fn duplicate_signup_is_rejected() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;
    backend
        .state()
        .create_user("ana@example.com", "secret1", false)
        .context("seed ana")?;

    let client = client_for(&backend)?;
    let err = client
        .auth()
        .sign_up("ana@example.com", "secret1")
        .await
        .expect_err("duplicate email should be rejected");
    let api = err.as_api().context("should be an API error")?;
    assert_eq!(api.status, 422);
    assert_eq!(api.code.as_deref(), Some("user_already_exists"));
    assert_eq!(api.message, "User already registered");
    Ok(())
}

#[tokio::test]
async fn weak_password_message_is_surfaced_verbatim() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;

    let client = client_for(&backend)?;
    let err = client
        .auth()
        .sign_up("ana@example.com", "abc")
        .await
        .expect_err("short password should be rejected");
    assert_eq!(err.to_string(), "Password should be at least 6 characters");
    Ok(())
}

#[tokio::test]
async fn password_reset_answers_uniformly() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;
    backend
        .state()
        .create_user("known@example.com", "secret1", true)
        .context("seed known")?;

    let client = client_for(&backend)?;
    client
        .auth()
        .reset_password_for_email("known@example.com", None)
        .await?;
    client
        .auth()
        .reset_password_for_email("unknown@example.com", None)
        .await?;
    assert_eq!(backend.state().recover_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn sign_out_clears_state_and_cache() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;
    backend
        .state()
        .create_user("ana@example.com", "secret1", true)
        .context("seed ana")?;

    let cache = Arc::new(MemoryCache::new());
    let client = Client::with_cache(
        Config::new(backend.url(), API_KEY)?,
        Arc::clone(&cache) as Arc<dyn konto_client::SessionCache>,
    )?;
    client.bootstrap().await;
    let (events, _sub) = record_events(&client);

    client
        .auth()
        .sign_in_with_password("ana@example.com", "secret1")
        .await?;
    assert!(cache.load().is_some());

    client.auth().sign_out().await?;
    assert_eq!(client.session().state(), AuthSessionState::Unauthenticated);
    assert!(cache.load().is_none());
    assert_eq!(
        *events.lock().expect("lock"),
        vec![AuthEvent::SignedIn, AuthEvent::SignedOut]
    );
    Ok(())
}

#[tokio::test]
async fn sign_out_succeeds_when_server_already_revoked() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;
    backend
        .state()
        .create_user("ana@example.com", "secret1", true)
        .context("seed ana")?;

    let client = client_for(&backend)?;
    client.bootstrap().await;
    client
        .auth()
        .sign_in_with_password("ana@example.com", "secret1")
        .await?;

    backend.state().revoke_all_sessions();

    client.auth().sign_out().await?;
    assert_eq!(client.session().state(), AuthSessionState::Unauthenticated);
    Ok(())
}

#[tokio::test]
async fn expired_session_is_refreshed_on_restore() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;
    let ana = backend
        .state()
        .create_user("ana@example.com", "secret1", true)
        .context("seed ana")?;
    let issued = backend.state().issue_session(ana.id);

    let cache = Arc::new(MemoryCache::preloaded(expired_copy(
        &issued.access_token,
        &issued.refresh_token,
        ana.id,
    )));
    let client = Client::with_cache(
        Config::new(backend.url(), API_KEY)?,
        Arc::clone(&cache) as Arc<dyn konto_client::SessionCache>,
    )?;
    let (events, _sub) = record_events(&client);

    client.bootstrap().await;
    assert!(client.session().state().is_authenticated());
    assert_eq!(*events.lock().expect("lock"), vec![AuthEvent::TokenRefreshed]);

    let stored = cache.load().context("refreshed session should be cached")?;
    assert_ne!(stored.access_token, issued.access_token);
    assert!(stored.expires_at > Utc::now());
    assert_eq!(backend.state().token_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn unrefreshable_session_is_discarded() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;
    let ana = backend
        .state()
        .create_user("ana@example.com", "secret1", true)
        .context("seed ana")?;

    // Tokens the backend has never issued: the refresh attempt must fail.
    let cache = Arc::new(MemoryCache::preloaded(expired_copy(
        "at-stale",
        "rt-stale",
        ana.id,
    )));
    let client = Client::with_cache(
        Config::new(backend.url(), API_KEY)?,
        Arc::clone(&cache) as Arc<dyn konto_client::SessionCache>,
    )?;
    let (events, _sub) = record_events(&client);

    client.bootstrap().await;
    assert_eq!(client.session().state(), AuthSessionState::Unauthenticated);
    assert!(cache.load().is_none());
    assert_eq!(*events.lock().expect("lock"), vec![AuthEvent::SignedOut]);
    Ok(())
}

#[tokio::test]
async fn get_user_validates_against_the_server() -> Result<()> {
    init_tracing();
    let backend = StubBackend::spawn().await?;
    backend
        .state()
        .create_user("ana@example.com", "secret1", true)
        .context("seed ana")?;

    let client = client_for(&backend)?;
    client.bootstrap().await;
    client
        .auth()
        .sign_in_with_password("ana@example.com", "secret1")
        .await?;

    let user = client.auth().get_user().await?;
    assert_eq!(
        user.map(|u| u.email).as_deref(),
        Some("ana@example.com")
    );

    backend.state().revoke_all_sessions();
    assert!(client.auth().get_user().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn transport_failures_do_not_sign_anyone_in() -> Result<()> {
    init_tracing();
    // Nothing is listening here.
    let client = Client::new(Config::new("http://127.0.0.1:1", API_KEY)?)?;
    client.bootstrap().await;

    let err = client
        .auth()
        .sign_in_with_password("ana@example.com", "secret1")
        .await
        .expect_err("unreachable backend should fail");
    assert!(matches!(err, Error::Network(_) | Error::Timeout(_)));
    assert_eq!(client.session().state(), AuthSessionState::Unauthenticated);
    Ok(())
}
