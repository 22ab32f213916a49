//! Signup form. Inputs are checked locally before the request goes out; the
//! backend decides account policy and its rejection messages are shown
//! verbatim. Deployments that auto-confirm accounts land on the dashboard
//! right away, the rest see the confirmation prompt and are forwarded to the
//! login form after a short pause.

use crate::components::{Alert, AlertKind, AppShell, Button, Spinner};
use crate::features::auth::state::use_auth;
use crate::forms;
use crate::forms::SignupOutcome;
use crate::routes::paths;
use gloo_timers::future::TimeoutFuture;
use leptos::ev::SubmitEvent;
use leptos::{prelude::*, task::spawn_local};
use leptos_router::hooks::use_navigate;

#[derive(Clone)]
/// Captures signup form input for the async action without borrowing signals.
struct SignupInput {
    email: String,
    password: String,
    confirm_password: String,
}

#[component]
pub fn SignUpPage() -> impl IntoView {
    let auth = use_auth();
    let is_authenticated = auth.is_authenticated;
    let navigate = use_navigate();
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (confirm_password, set_confirm_password) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);
    let (notice, set_notice) = signal::<Option<String>>(None);

    // Local checks run inside the action; a rejected form sends nothing.
    let signup_action = Action::new_local(move |input: &SignupInput| {
        let input = input.clone();
        let client = auth.client();
        async move {
            forms::submit_signup(
                &client,
                &input.email,
                &input.password,
                &input.confirm_password,
            )
            .await
        }
    });

    // Auto-confirmed deployments issue a session immediately; the state
    // change takes the user to the dashboard.
    let navigate_signed_in = navigate.clone();
    Effect::new(move |_| {
        if is_authenticated.get() {
            navigate_signed_in(paths::DASHBOARD, Default::default());
        }
    });

    Effect::new(move |_| {
        if let Some(result) = signup_action.value().get() {
            match result {
                Ok(response) => {
                    if forms::signup_outcome(&response) == SignupOutcome::ConfirmationPending {
                        set_notice.set(Some(forms::PENDING_CONFIRMATION_MESSAGE.to_string()));
                        set_email.set(String::new());
                        set_password.set(String::new());
                        set_confirm_password.set(String::new());
                        let navigate = navigate.clone();
                        spawn_local(async move {
                            TimeoutFuture::new(forms::CONFIRMATION_REDIRECT_DELAY_MS).await;
                            navigate(paths::LOGIN, Default::default());
                        });
                    }
                }
                Err(message) => set_error.set(Some(message)),
            }
        }
    });

    let on_submit = move |event: SubmitEvent| {
        event.prevent_default();
        set_error.set(None);
        set_notice.set(None);

        signup_action.dispatch(SignupInput {
            email: email.get_untracked().trim().to_string(),
            password: password.get_untracked(),
            confirm_password: confirm_password.get_untracked(),
        });
    };

    view! {
        <AppShell>
            <form class="mx-auto max-w-sm" on:submit=on_submit>
                <h1 class="mb-2 text-2xl font-semibold text-slate-900">"Create account"</h1>
                <p class="mb-6 text-sm text-slate-500">
                    "You may need to confirm your email before signing in."
                </p>
                <div class="mb-5">
                    <label class="mb-2 block text-sm font-medium text-slate-700" for="email">
                        "Email"
                    </label>
                    <input
                        id="email"
                        type="email"
                        class="block w-full rounded-lg border border-slate-300 bg-white p-2.5 text-sm text-slate-900 focus:border-indigo-500 focus:ring-indigo-500"
                        autocomplete="email"
                        inputmode="email"
                        placeholder="name@example.com"
                        required
                        prop:value=email
                        on:input=move |event| set_email.set(event_target_value(&event))
                    />
                </div>
                <div class="mb-5">
                    <label class="mb-2 block text-sm font-medium text-slate-700" for="password">
                        "Password"
                    </label>
                    <input
                        id="password"
                        type="password"
                        class="block w-full rounded-lg border border-slate-300 bg-white p-2.5 text-sm text-slate-900 focus:border-indigo-500 focus:ring-indigo-500"
                        autocomplete="new-password"
                        required
                        prop:value=password
                        on:input=move |event| set_password.set(event_target_value(&event))
                    />
                </div>
                <div class="mb-5">
                    <label
                        class="mb-2 block text-sm font-medium text-slate-700"
                        for="confirm_password"
                    >
                        "Confirm password"
                    </label>
                    <input
                        id="confirm_password"
                        type="password"
                        class="block w-full rounded-lg border border-slate-300 bg-white p-2.5 text-sm text-slate-900 focus:border-indigo-500 focus:ring-indigo-500"
                        autocomplete="new-password"
                        required
                        prop:value=confirm_password
                        on:input=move |event| {
                            set_confirm_password.set(event_target_value(&event));
                        }
                    />
                </div>
                <Button button_type="submit" disabled=signup_action.pending()>
                    "Create account"
                </Button>
                {move || {
                    signup_action
                        .pending()
                        .get()
                        .then_some(view! { <div class="mt-4"><Spinner /></div> })
                }}
                {move || {
                    notice
                        .get()
                        .map(|message| {
                            view! {
                                <div class="mt-4">
                                    <Alert kind=AlertKind::Info message=message />
                                </div>
                            }
                        })
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
