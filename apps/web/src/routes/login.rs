//! Login form. A successful grant flips the shared session state, and the
//! page navigates wherever the route guard sent the user from (default the
//! dashboard). Backend rejections are shown word for word.

use crate::components::{Alert, AlertKind, AppShell, Button, Spinner};
use crate::features::auth::state::use_auth;
use crate::forms;
use crate::routes::paths;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;
use web_sys::{UrlSearchParams, window};

#[derive(Clone)]
struct LoginInput {
    email: String,
    password: String,
}

/// Reads the `from` query parameter left behind by the route guard.
fn redirect_target() -> String {
    let search = window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    let from = UrlSearchParams::new_with_str(search.trim_start_matches('?'))
        .ok()
        .and_then(|params| params.get("from"));
    konto_client::guard::return_target(from.as_deref())
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let is_authenticated = auth.is_authenticated;
    let navigate = use_navigate();
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);

    let login_action = Action::new_local(move |input: &LoginInput| {
        let input = input.clone();
        let client = auth.client();
        async move {
            client
                .auth()
                .sign_in_with_password(&input.email, &input.password)
                .await
        }
    });

    // Navigation is driven by the session state rather than the call result,
    // so an already signed-in visitor is forwarded too.
    Effect::new(move |_| {
        if is_authenticated.get() {
            navigate(&redirect_target(), Default::default());
        }
    });

    Effect::new(move |_| {
        if let Some(Err(err)) = login_action.value().get() {
            set_error.set(Some(err.to_string()));
        }
    });

    let on_submit = move |event: SubmitEvent| {
        event.prevent_default();
        set_error.set(None);

        let email_value = email.get_untracked().trim().to_string();
        let password_value = password.get_untracked();
        if let Err(message) = forms::validate_login(&email_value, &password_value) {
            set_error.set(Some(message));
            return;
        }

        login_action.dispatch(LoginInput {
            email: email_value,
            password: password_value,
        });
    };

    view! {
        <AppShell>
            <form class="mx-auto max-w-sm" on:submit=on_submit>
                <h1 class="mb-6 text-2xl font-semibold text-slate-900">"Sign in"</h1>
                <div class="mb-5">
                    <label class="mb-2 block text-sm font-medium text-slate-700" for="email">
                        "Your email"
                    </label>
                    <input
                        id="email"
                        type="email"
                        class="block w-full rounded-lg border border-slate-300 bg-white p-2.5 text-sm text-slate-900 focus:border-indigo-500 focus:ring-indigo-500"
                        autocomplete="email"
                        placeholder="name@example.com"
                        required
                        on:input=move |event| set_email.set(event_target_value(&event))
                    />
                </div>
                <div class="mb-5">
                    <label class="mb-2 block text-sm font-medium text-slate-700" for="password">
                        "Your password"
                    </label>
                    <input
                        id="password"
                        type="password"
                        class="block w-full rounded-lg border border-slate-300 bg-white p-2.5 text-sm text-slate-900 focus:border-indigo-500 focus:ring-indigo-500"
                        autocomplete="current-password"
                        required
                        on:input=move |event| set_password.set(event_target_value(&event))
                    />
                </div>
                <Button button_type="submit" disabled=login_action.pending()>
                    "Sign in"
                </Button>
                <div class="mt-4 flex justify-between text-sm text-slate-500">
                    <A href=paths::SIGNUP {..} class="hover:text-indigo-600">
                        "Create an account"
                    </A>
                    <A href=paths::RESET_PASSWORD {..} class="hover:text-indigo-600">
                        "Forgot password?"
                    </A>
                </div>
                {move || {
                    login_action
                        .pending()
                        .get()
                        .then_some(view! { <div class="mt-4"><Spinner /></div> })
                }}
                {move || {
                    error
                        .get()
                        .map(|message| {
                            view! {
                                <div class="mt-4">
                                    <Alert kind=AlertKind::Error message=message />
                                </div>
                            }
                        })
                }}
            </form>
        </AppShell>
    }
}
