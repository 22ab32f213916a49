//! Password reset request form. The backend answers the same way whether or
//! not the address is registered, and the page mirrors that with one uniform
//! confirmation message.

use crate::components::{Alert, AlertKind, AppShell, Button, Spinner};
use crate::features::auth::state::use_auth;
use crate::forms;
use crate::routes::paths;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;

/// Where the emailed reset link should land: the login form on this origin.
fn reset_redirect() -> Option<String> {
    let origin = web_sys::window()?.location().origin().ok()?;
    Some(format!("{origin}{}", paths::LOGIN))
}

#[component]
pub fn ResetPasswordPage() -> impl IntoView {
    let auth = use_auth();
    let (email, set_email) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);
    let (sent, set_sent) = signal(false);

    let reset_action = Action::new_local(move |email: &String| {
        let email = email.clone();
        let client = auth.client();
        async move {
            let redirect = reset_redirect();
            client
                .auth()
                .reset_password_for_email(&email, redirect.as_deref())
                .await
        }
    });

    Effect::new(move |_| {
        if let Some(result) = reset_action.value().get() {
            match result {
                Ok(()) => set_sent.set(true),
                Err(err) => set_error.set(Some(err.to_string())),
            }
        }
    });

    let on_submit = move |event: SubmitEvent| {
        event.prevent_default();
        set_error.set(None);
        set_sent.set(false);

        let email_value = email.get_untracked().trim().to_string();
        if let Err(message) = forms::validate_reset(&email_value) {
            set_error.set(Some(message));
            return;
        }

        reset_action.dispatch(email_value);
    };

    view! {
        <AppShell>
            <form class="mx-auto max-w-sm" on:submit=on_submit>
                <h1 class="mb-2 text-2xl font-semibold text-slate-900">"Reset password"</h1>
                <p class="mb-6 text-sm text-slate-500">
                    "Enter your email and we will send you a reset link."
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
                        placeholder="name@example.com"
                        required
                        on:input=move |event| set_email.set(event_target_value(&event))
                    />
                </div>
                <Button button_type="submit" disabled=reset_action.pending()>
                    "Send reset link"
                </Button>
                {move || {
                    reset_action
                        .pending()
                        .get()
                        .then_some(view! { <div class="mt-4"><Spinner /></div> })
                }}
                {move || {
                    sent.get()
                        .then_some(view! {
                            <div class="mt-4">
                                <Alert
                                    kind=AlertKind::Success
                                    message=forms::RESET_SENT_MESSAGE.to_string()
                                />
                            </div>
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
