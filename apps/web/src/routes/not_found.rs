//! Minimal 404 page for unknown routes.

use crate::components::AppShell;
use leptos::prelude::*;
use leptos_router::components::A;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <AppShell>
            <div class="flex min-h-[50vh] flex-col items-center justify-center px-4 text-center">
                <h1 class="text-8xl font-black text-slate-200 select-none">"404"</h1>
                <p class="mt-2 text-xl font-semibold text-slate-900">"Page not found"</p>
                <p class="mt-2 max-w-sm text-slate-500">
                    "The page you requested does not exist."
                </p>
                <div class="mt-6 flex items-center gap-4">
                    <A
                        href="/"
                        {..}
                        class="rounded-lg bg-indigo-600 px-5 py-2.5 text-sm font-medium text-white hover:bg-indigo-700"
                    >
                        "Go Home"
                    </A>
                    <button
                        type="button"
                        class="rounded-lg border border-slate-300 bg-white px-5 py-2.5 text-sm font-medium text-slate-700 hover:bg-slate-100"
                        on:click=move |_| {
                            if let Some(window) = web_sys::window() {
                                if let Ok(history) = window.history() {
                                    let _ = history.back();
                                }
                            }
                        }
                    >
                        "Go Back"
                    </button>
                </div>
            </div>
        </AppShell>
    }
}
