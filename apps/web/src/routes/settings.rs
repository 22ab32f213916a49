//! Account settings for the signed-in user: shows the account email and lets
//! the user edit their profile. Reads go through the profile store's cache;
//! a save submits only the fields that actually changed, so saving without
//! edits writes nothing.

use crate::components::{Alert, AlertKind, AppShell, Button, Spinner};
use crate::features::auth::RequireAuth;
use crate::features::auth::state::use_auth;
use konto_client::{AuthSessionState, ProfileChanges};
use leptos::ev::SubmitEvent;
use leptos::prelude::*;

#[component]
pub fn SettingsPage() -> impl IntoView {
    view! {
        <AppShell>
            <RequireAuth>
                <SettingsContent />
            </RequireAuth>
        </AppShell>
    }
}

#[component]
fn SettingsContent() -> impl IntoView {
    let auth = use_auth();
    let state = auth.state;

    let profile = LocalResource::new(move || {
        let client = auth.client();
        async move { client.profiles().get_profile().await }
    });

    let (username, set_username) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);
    let (saved, set_saved) = signal(false);

    let update_action = Action::new_local(move |changes: &ProfileChanges| {
        let changes = changes.clone();
        let client = auth.client();
        async move { client.profiles().update_profile(&changes).await }
    });

    Effect::new(move |_| {
        if let Some(result) = update_action.value().get() {
            match result {
                Ok(_) => {
                    set_saved.set(true);
                    profile.refetch();
                }
                Err(err) => set_error.set(Some(err.to_string())),
            }
        }
    });

    let email = Signal::derive(move || match state.get() {
        AuthSessionState::Authenticated(session) => session.user.email,
        _ => String::new(),
    });

    view! {
        <div class="max-w-lg space-y-4">
            <h1 class="text-2xl font-semibold text-slate-900">"Settings"</h1>
            <div class="rounded-lg border border-slate-200 bg-white p-6">
                <Suspense fallback=move || view! { <Spinner /> }>
                    {move || match profile.get() {
                        Some(Some(stored)) => {
                            let current = stored.username.clone().unwrap_or_default();
                            let last_updated = stored
                                .updated_at
                                .map(|stamp| stamp.format("%Y-%m-%d %H:%M UTC").to_string());
                            let on_submit = {
                                let current = current.clone();
                                move |event: SubmitEvent| {
                                    event.prevent_default();
                                    set_error.set(None);
                                    set_saved.set(false);

                                    let entered = username.get_untracked().trim().to_string();
                                    let mut changes = ProfileChanges::default();
                                    if !entered.is_empty() && entered != current {
                                        changes.username = Some(entered);
                                    }
                                    update_action.dispatch(changes);
                                }
                            };
                            view! {
                                <div class="space-y-4">
                                    <div>
                                        <span class="block text-sm font-medium text-slate-500">
                                            "Email"
                                        </span>
                                        <div class="text-slate-900">{move || email.get()}</div>
                                    </div>
                                    <form class="space-y-3" on:submit=on_submit>
                                        <div>
                                            <label
                                                class="mb-1 block text-sm font-medium text-slate-500"
                                                for="username"
                                            >
                                                "Username"
                                            </label>
                                            <input
                                                id="username"
                                                type="text"
                                                class="block w-full rounded-lg border border-slate-300 bg-white p-2.5 text-sm text-slate-900 focus:border-indigo-500 focus:ring-indigo-500"
                                                value=current
                                                placeholder="Pick a username"
                                                on:input=move |event| {
                                                    set_username.set(event_target_value(&event));
                                                }
                                            />
                                        </div>
                                        <Button button_type="submit" disabled=update_action.pending()>
                                            "Save"
                                        </Button>
                                        {move || {
                                            update_action
                                                .pending()
                                                .get()
                                                .then_some(view! { <div class="mt-2"><Spinner /></div> })
                                        }}
                                        {move || {
                                            saved
                                                .get()
                                                .then_some(view! {
                                                    <Alert
                                                        kind=AlertKind::Success
                                                        message="Profile updated.".to_string()
                                                    />
                                                })
                                        }}
                                        {move || {
                                            error
                                                .get()
                                                .map(|message| {
                                                    view! {
                                                        <Alert kind=AlertKind::Error message=message />
                                                    }
                                                })
                                        }}
                                    </form>
                                    {last_updated
                                        .map(|stamp| {
                                            view! {
                                                <p class="text-xs text-slate-400">
                                                    {format!("Last updated {stamp}")}
                                                </p>
                                            }
                                        })}
                                </div>
                            }
                            .into_any()
                        }
                        Some(None) => {
                            view! {
                                <Alert
                                    kind=AlertKind::Error
                                    message="Could not load your profile. Try reloading the page."
                                        .to_string()
                                />
                            }
                            .into_any()
                        }
                        None => view! { <Spinner /> }.into_any(),
                    }}
                </Suspense>
            </div>
        </div>
    }
}
