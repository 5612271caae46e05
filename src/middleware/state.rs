use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::{AuthSettings, WebAuthConfig};
use super::traits::{SessionStore, SessionStoreDyn};
use crate::authenticator::SessionAuthenticator;

/// Shared state for auth route handlers and the [`AuthUser`](super::AuthUser) extractor.
///
/// Cheap to clone. Build once, then hand it to [`auth_routes`](super::auth_routes)
/// and any router that needs authenticated users.
#[derive(Clone)]
pub struct AuthState {
    pub(super) authenticator: Arc<SessionAuthenticator>,
    pub(super) session_store: Arc<dyn SessionStoreDyn>,
    pub(super) settings: AuthSettings,
}

impl AuthState {
    pub fn new<S: SessionStore>(config: WebAuthConfig, session_store: S) -> Self {
        Self {
            authenticator: Arc::new(config.authenticator),
            session_store: Arc::new(session_store),
            settings: config.settings,
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.settings.cookie_key.clone()
    }
}
