//! Stub backend server for integration tests.
//!
//! Serves the identity and profile endpoints on an ephemeral localhost port.
//! The server task is aborted when the handle drops.

use crate::state::BackendState;
use crate::{auth, rest};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// API key the stub accepts. Clients under test must send it.
pub const API_KEY: &str = "konto-test-key";

pub struct StubBackend {
    url: String,
    state: Arc<BackendState>,
    server: JoinHandle<()>,
}

impl StubBackend {
    /// Bind an ephemeral port and serve the stub until the handle drops.
    ///
    /// # Errors
    /// Returns an error if the listener cannot bind.
    pub async fn spawn() -> Result<Self> {
        let state = Arc::new(BackendState::new());
        let app = router(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind stub backend listener")?;
        let addr = listener
            .local_addr()
            .context("Failed to read stub backend address")?;
        let url = format!("http://{addr}");
        info!("stub backend listening on {url}");

        let server = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app.into_make_service()).await {
                error!("stub backend exited: {err}");
            }
        });

        Ok(Self {
            url,
            state,
            server,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn state(&self) -> &Arc<BackendState> {
        &self.state
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/auth/v1/signup", post(auth::signup))
        .route("/auth/v1/token", post(auth::token))
        .route("/auth/v1/logout", post(auth::logout))
        .route("/auth/v1/recover", post(auth::recover))
        .route("/auth/v1/user", get(auth::user))
        .route(
            "/rest/v1/profiles",
            get(rest::select_profiles).post(rest::upsert_profile),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
