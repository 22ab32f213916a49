//! Landing page for signed-in users.

use crate::components::AppShell;
use crate::features::auth::RequireAuth;
use crate::features::auth::state::use_auth;
use crate::routes::paths;
use konto_client::AuthSessionState;
use leptos::prelude::*;
use leptos_router::components::A;

#[component]
pub fn DashboardPage() -> impl IntoView {
    view! {
        <AppShell>
            <RequireAuth>
                <DashboardContent />
            </RequireAuth>
        </AppShell>
    }
}

#[component]
fn DashboardContent() -> impl IntoView {
    let state = use_auth().state;
    let email = Signal::derive(move || match state.get() {
        AuthSessionState::Authenticated(session) => session.user.email,
        _ => String::new(),
    });

    view! {
        <div class="space-y-4">
            <h1 class="text-2xl font-semibold text-slate-900">"Dashboard"</h1>
            <p class="text-slate-600">
                "Signed in as "
                <span class="font-medium text-slate-900">{move || email.get()}</span>
            </p>
            <p class="text-sm text-slate-500">
                "Head over to "
                <A href=paths::SETTINGS {..} class="text-indigo-600 hover:underline">
                    "Settings"
                </A> " to edit your profile."
            </p>
        </div>
    }
}
