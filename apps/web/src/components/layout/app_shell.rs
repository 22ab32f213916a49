//! Shared layout wrapper with the navigation header and content container.
//! The header reacts to the session state signal; sign-out goes through the
//! shared client so every subscriber sees the change.

use crate::app_lib::build_info;
use crate::features::auth::state::use_auth;
use crate::routes::paths;
use leptos::{prelude::*, task::spawn_local};
use leptos_router::components::A;

/// Wraps routes with a header, main content container, and footer.
#[component]
pub fn AppShell(children: Children) -> impl IntoView {
    let auth = use_auth();
    let is_authenticated = auth.is_authenticated;

    view! {
        <div class="min-h-screen flex flex-col bg-slate-50">
            <header class="border-b border-slate-200 bg-white">
                <div class="mx-auto flex max-w-screen-lg items-center justify-between px-4 py-3">
                    <A href=paths::DASHBOARD {..} class="flex items-center gap-2">
                        <span class="inline-flex h-8 w-8 items-center justify-center rounded-lg bg-indigo-600 text-sm font-bold text-white">
                            "k"
                        </span>
                        <span class="font-semibold text-slate-900">"konto"</span>
                    </A>
                    <nav class="flex items-center gap-5 text-sm font-medium text-slate-700">
                        <Show
                            when=move || is_authenticated.get()
                            fallback=move || {
                                view! {
                                    <A href=paths::LOGIN {..} class="hover:text-indigo-600">
                                        "Sign In"
                                    </A>
                                    <A href=paths::SIGNUP {..} class="hover:text-indigo-600">
                                        "Sign Up"
                                    </A>
                                }
                            }
                        >
                            <A href=paths::SETTINGS {..} class="hover:text-indigo-600">
                                "Settings"
                            </A>
                            <button
                                type="button"
                                class="hover:text-indigo-600"
                                on:click=move |_| {
                                    let client = auth.client();
                                    spawn_local(async move {
                                        let _ = client.auth().sign_out().await;
                                    });
                                }
                            >
                                "Sign Out"
                            </button>
                        </Show>
                    </nav>
                </div>
            </header>
            <main class="flex-1">
                <div class="mx-auto max-w-screen-lg px-4 py-8">{children()}</div>
            </main>
            <footer class="border-t border-slate-200 py-4 text-center text-xs text-slate-400">
                {format!("konto {}", build_info::git_commit_hash())}
            </footer>
        </div>
    }
}
