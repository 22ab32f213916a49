//! Shared frontend utilities for configuration and build metadata.
//!
//! The app talks to a single hosted backend: one base URL serves both the
//! auth endpoints and the data API, authenticated with the public (anonymous
//! role) API key. Both values are baked in at build time and can be replaced
//! at deploy time through `window.KONTO_CONFIG`; neither is a secret.

pub(crate) mod build_info;
pub(crate) mod config;
pub(crate) mod session_sync;
