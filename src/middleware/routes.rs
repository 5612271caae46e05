use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum_extra::extract::PrivateCookieJar;

use super::cookies;
use super::error::{AuthError, store_error};
use super::extractor::load_or_start_session;
use super::state::AuthState;
use super::types::SessionView;
use crate::authenticator::{RedirectParams, RenderOutcome};
use crate::session::Session;
use crate::types::SessionId;

/// Create the authentication router.
///
/// Routes (under the configured auth path, `/auth` by default):
/// `GET /session`, `GET /login`, `GET /callback`, `POST /logout`.
pub fn auth_routes(state: AuthState) -> Router {
    let auth_path = state.settings.auth_path.clone();

    Router::new()
        .route(&format!("{auth_path}/session"), get(session_status))
        .route(&format!("{auth_path}/login"), get(login))
        .route(&format!("{auth_path}/callback"), get(callback))
        .route(&format!("{auth_path}/logout"), post(logout))
        .with_state(state)
}

// ── Session ────────────────────────────────────────────────────────

async fn session_status(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<SessionView>), AuthError> {
    let (jar, session_id, mut session) = load_or_start_session(&state, jar).await?;

    let view = match state
        .authenticator
        .render(&mut session, &mut RedirectParams::default())
        .await
    {
        RenderOutcome::Authenticated(identity) => SessionView {
            authenticated: true,
            phase: session.phase(),
            identity: Some(identity),
            login_url: None,
        },
        RenderOutcome::LoginRequired { authorization_url } => SessionView {
            authenticated: false,
            phase: session.phase(),
            identity: None,
            login_url: Some(authorization_url.into()),
        },
        RenderOutcome::Failed(e) => return Err(e.into()),
    };

    save_session(&state, &session_id, &session).await?;
    Ok((jar, Json(view)))
}

// ── Login ──────────────────────────────────────────────────────────

async fn login(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), AuthError> {
    let (jar, session_id, mut session) = load_or_start_session(&state, jar).await?;

    match state
        .authenticator
        .render(&mut session, &mut RedirectParams::default())
        .await
    {
        RenderOutcome::Authenticated(_) => Ok((jar, Redirect::to(&state.settings.login_redirect))),
        RenderOutcome::LoginRequired { authorization_url } => {
            save_session(&state, &session_id, &session).await?;
            Ok((jar, Redirect::to(authorization_url.as_str())))
        }
        RenderOutcome::Failed(e) => Err(e.into()),
    }
}

// ── Callback ───────────────────────────────────────────────────────

async fn callback(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    Query(mut params): Query<RedirectParams>,
) -> Result<(PrivateCookieJar, Redirect), Response> {
    let error_redirect = &state.settings.error_redirect;

    if !params.is_redirect() {
        return Err(login_error(error_redirect, "missing_code"));
    }

    let (jar, session_id, mut session) = load_or_start_session(&state, jar)
        .await
        .map_err(IntoResponse::into_response)?;
    let was_authenticated = session.is_authenticated();

    match state.authenticator.render(&mut session, &mut params).await {
        RenderOutcome::Authenticated(_) if was_authenticated => {
            Ok((jar, Redirect::to(&state.settings.login_redirect)))
        }
        RenderOutcome::Authenticated(_) => {
            // Fresh id after sign-in; the pre-login id is discarded.
            let new_id = SessionId::generate();
            save_session(&state, &new_id, &session)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Session save failed after sign-in");
                    login_error(error_redirect, "session_failed")
                })?;
            if let Err(e) = state.session_store.delete_dyn(&session_id).await {
                tracing::warn!(error = %e, "Pre-login session deletion failed");
            }

            let cookie = cookies::session_cookie(
                &state.settings.session_cookie_name,
                &new_id,
                state.settings.session_ttl_days,
                state.settings.secure_cookies,
            );
            tracing::info!(session_id = %new_id, "Session authenticated");

            Ok((jar.add(cookie), Redirect::to(&state.settings.login_redirect)))
        }
        RenderOutcome::LoginRequired { .. } => Err(login_error(error_redirect, "missing_code")),
        RenderOutcome::Failed(e) => Err(login_error(error_redirect, e.kind())),
    }
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    if let Some(session_id) = cookies::get_session_id(&jar, &state.settings.session_cookie_name) {
        match state.session_store.load_dyn(&session_id).await {
            Ok(Some(mut session)) => {
                state.authenticator.logout(&mut session);
                if let Err(e) = save_session(&state, &session_id, &session).await {
                    tracing::warn!(error = %e, "Session save failed during logout");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Session load failed during logout"),
        }
    }

    (jar, Redirect::to(&state.settings.logout_redirect))
}

// ── Helpers ────────────────────────────────────────────────────────

async fn save_session(
    state: &AuthState,
    session_id: &SessionId,
    session: &Session,
) -> Result<(), AuthError> {
    state
        .session_store
        .save_dyn(session_id, session)
        .await
        .map_err(store_error)
}

fn login_error(error_redirect: &str, code: &str) -> Response {
    let encoded = urlencoding::encode(code);
    Redirect::to(&format!("{error_redirect}?error={encoded}")).into_response()
}
