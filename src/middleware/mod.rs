//! Plug-and-play sign-in and résumé routes for Axum.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use careerdoc_auth::middleware::{
//!     AuthState, MemoryResumeStore, MemorySessionStore, WebAuthConfig, auth_routes, resume_routes,
//! };
//!
//! // 1. Configure from environment
//! let config = WebAuthConfig::from_env()?;
//!
//! // 2. Build shared state over a session store
//! let auth = AuthState::new(config, MemorySessionStore::new());
//!
//! // 3. Mount routes
//! let app = axum::Router::new()
//!     .merge(auth_routes(auth.clone()))
//!     .merge(resume_routes(auth, MemoryResumeStore::new()));
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod resume;
mod routes;
mod state;
mod store;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use config::WebAuthConfig;
pub use error::AuthError;
pub use extractor::AuthUser;
pub use resume::resume_routes;
pub use routes::auth_routes;
pub use state::AuthState;
pub use store::{MemoryResumeStore, MemorySessionStore};
pub use traits::{SessionStore, StoreError};
pub use types::SessionView;

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
