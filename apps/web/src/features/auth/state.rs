//! Auth session state and context for the frontend. The provider builds the
//! shared [`Client`] once, resolves the stored session on mount, and keeps a
//! signal in sync with the client's session store so guards and routes can
//! react without issuing their own requests.

use crate::app_lib::config::AppConfig;
use crate::app_lib::session_sync;
use crate::components::{Alert, AlertKind};
use crate::features::auth::storage::LocalStorageCache;
use konto_client::{AuthSessionState, Client, Config, Error};
use leptos::{prelude::*, task::spawn_local};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone, Copy)]
/// Auth session context shared through Leptos.
pub struct AuthContext {
    client: StoredValue<Arc<Client>, LocalStorage>,
    pub state: RwSignal<AuthSessionState>,
    pub is_authenticated: Signal<bool>,
}

impl AuthContext {
    /// Builds a context around the shared client and its state signal.
    fn new(client: Arc<Client>, state: RwSignal<AuthSessionState>) -> Self {
        let is_authenticated = Signal::derive(move || state.get().is_authenticated());
        Self {
            client: StoredValue::new_local(client),
            state,
            is_authenticated,
        }
    }

    /// Handle to the shared backend client.
    pub fn client(&self) -> Arc<Client> {
        self.client.get_value()
    }
}

fn build_client(config: &AppConfig) -> Result<Client, Error> {
    let config = Config::new(&config.backend_url, &config.api_key)?;
    Client::with_cache(config, Arc::new(LocalStorageCache))
}

/// Provides auth context and resolves the stored session once on mount.
///
/// When the backend endpoint or API key is missing the app cannot work at
/// all, so the provider renders the configuration error instead of its
/// children.
#[component]
pub fn AuthProvider(children: Children) -> impl IntoView {
    let client = match build_client(&AppConfig::load()) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            return view! {
                <div class="max-w-lg mx-auto mt-16 px-4">
                    <Alert kind=AlertKind::Error message=err.to_string() />
                </div>
            }
            .into_any();
        }
    };

    let state = RwSignal::new(client.session().state());
    provide_context(AuthContext::new(Arc::clone(&client), state));

    // Stops the sync task when the provider's scope is disposed.
    let alive = Arc::new(AtomicBool::new(true));
    on_cleanup({
        let alive = Arc::clone(&alive);
        move || alive.store(false, Ordering::SeqCst)
    });

    let store = Arc::clone(client.session());
    spawn_local(async move {
        session_sync::pump_states(store, alive, move |next| state.set(next)).await;
    });

    spawn_local(async move {
        client.bootstrap().await;
    });

    view! { {children()} }.into_any()
}

/// Returns the auth context installed by [`AuthProvider`].
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthProvider must wrap the routes")
}
