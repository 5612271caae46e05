use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::Key;

use super::cookies;
use super::error::{AuthError, store_error};
use super::state::AuthState;
use crate::oauth::UserIdentity;
use crate::session::Session;
use crate::types::SessionId;

/// Authenticated user extracted from the session cookie.
///
/// Use as an Axum extractor in route handlers. Returns `401 Unauthorized`
/// unless the session has completed sign-in.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}", user.identity.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Session ID (from cookie).
    pub session_id: SessionId,
    /// Identity stored in the session at sign-in.
    pub identity: UserIdentity,
}

impl<T> FromRequestParts<T> for AuthUser
where
    T: Send + Sync,
    AuthState: FromRef<T>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &T) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let jar: PrivateCookieJar<Key> = PrivateCookieJar::from_request_parts(parts, &auth)
            .await
            .map_err(|_| AuthError::Unauthenticated)?;

        let session_id = cookies::get_session_id(&jar, &auth.settings.session_cookie_name)
            .ok_or(AuthError::Unauthenticated)?;

        let session = auth
            .session_store
            .load_dyn(&session_id)
            .await
            .map_err(store_error)?
            .ok_or(AuthError::Unauthenticated)?;

        let identity = session
            .identity()
            .cloned()
            .ok_or(AuthError::Unauthenticated)?;

        Ok(Self {
            session_id,
            identity,
        })
    }
}

/// Load the caller's session, or start a new anonymous one.
///
/// A new session gets a fresh id and its cookie is added to the returned jar;
/// it is not stored until the caller saves it.
pub(super) async fn load_or_start_session(
    state: &AuthState,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, SessionId, Session), AuthError> {
    if let Some(session_id) = cookies::get_session_id(&jar, &state.settings.session_cookie_name) {
        if let Some(session) = state
            .session_store
            .load_dyn(&session_id)
            .await
            .map_err(store_error)?
        {
            return Ok((jar, session_id, session));
        }
    }

    let session_id = SessionId::generate();
    let jar = jar.add(cookies::session_cookie(
        &state.settings.session_cookie_name,
        &session_id,
        state.settings.session_ttl_days,
        state.settings.secure_cookies,
    ));
    Ok((jar, session_id, Session::new()))
}
