//! Auth feature module covering session state propagation and route gating.
//! The provider owns the shared backend client and mirrors its session store
//! into a signal; everything else reads that signal instead of asking the
//! backend again. This module must avoid logging token material.

mod guards;
pub(crate) mod state;
pub(crate) mod storage;

pub(crate) use guards::RequireAuth;
