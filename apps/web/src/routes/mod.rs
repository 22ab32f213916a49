mod dashboard;
mod login;
mod not_found;
mod reset_password;
mod settings;
mod signup;

pub(crate) use dashboard::DashboardPage;
pub(crate) use login::LoginPage;
pub(crate) use not_found::NotFoundPage;
pub(crate) use reset_password::ResetPasswordPage;
pub(crate) use settings::SettingsPage;
pub(crate) use signup::SignUpPage;

use leptos::prelude::*;
use leptos_router::components::{Route, Routes};
use leptos_router::path;

pub(crate) mod paths {
    pub(crate) const DASHBOARD: &str = "/";
    pub(crate) const LOGIN: &str = konto_client::guard::LOGIN_PATH;
    pub(crate) const SIGNUP: &str = "/signup";
    pub(crate) const RESET_PASSWORD: &str = "/reset-password";
    pub(crate) const SETTINGS: &str = "/settings";
}

#[component]
pub fn AppRoutes() -> impl IntoView {
    view! {
        <Routes fallback=|| view! { <NotFoundPage /> }>
            <Route path=path!("/") view=DashboardPage />
            <Route path=path!("/login") view=LoginPage />
            <Route path=path!("/signup") view=SignUpPage />
            <Route path=path!("/reset-password") view=ResetPasswordPage />
            <Route path=path!("/settings") view=SettingsPage />
            <Route path=path!("/*any") view=NotFoundPage />
        </Routes>
    }
}
