use crate::components::Spinner;
use crate::features::auth::state::use_auth;
use konto_client::guard::{self, RouteDecision};
use leptos::prelude::*;
use leptos_router::hooks::{use_location, use_navigate};

/// Gates its children on the session state: renders them once a session is
/// confirmed, shows a placeholder while the stored session is still being
/// resolved, and bounces to the login form otherwise.
#[component]
pub fn RequireAuth(children: ChildrenFn) -> impl IntoView {
    let state = use_auth().state;
    let location = use_location();
    let decision = Signal::derive(move || {
        let path = location.pathname.get();
        let search = location.search.get();
        let requested = if search.is_empty() {
            path
        } else {
            format!("{path}?{search}")
        };
        guard::evaluate(&state.get(), &requested)
    });

    let navigate = use_navigate();
    Effect::new(move |_| {
        if let RouteDecision::RedirectToLogin { from } = decision.get() {
            // UX-only guard; real access control lives in the backend's row policies.
            navigate(&guard::login_path_for(&from), Default::default());
        }
    });

    move || match decision.get() {
        RouteDecision::Render => children(),
        _ => view! {
            <div class="flex justify-center py-16">
                <Spinner />
            </div>
        }
        .into_any(),
    }
}
