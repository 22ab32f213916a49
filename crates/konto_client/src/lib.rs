mod auth;
mod client;
mod config;
mod error;
mod profile;
mod session;
mod storage;
mod transport;
mod types;

pub mod guard;

pub use auth::{AuthClient, AuthSubscription};
pub use client::Client;
pub use config::Config;
pub use error::{ApiError, Error};
pub use profile::ProfileStore;
pub use session::{AuthSessionState, SessionStore};
pub use storage::{MemoryCache, NoPersistence, SessionCache};
pub use types::{AuthEvent, AuthResponse, Profile, ProfileChanges, Session, User};
