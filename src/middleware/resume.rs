use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use super::error::{AuthError, store_error};
use super::extractor::AuthUser;
use super::state::AuthState;
use crate::resume::{ResumeData, ResumeRecord, ResumeStore};
use crate::types::OwnerEmail;

struct ResumeState<R> {
    auth: AuthState,
    store: Arc<R>,
}

// Manual Clone: avoid derive adding an `R: Clone` bound.
impl<R> Clone for ResumeState<R> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            store: self.store.clone(),
        }
    }
}

impl<R> FromRef<ResumeState<R>> for AuthState {
    fn from_ref(state: &ResumeState<R>) -> Self {
        state.auth.clone()
    }
}

/// Create the résumé router: `GET /resume` and `PUT /resume`, signed-in users only.
pub fn resume_routes<R: ResumeStore>(auth: AuthState, store: R) -> Router {
    Router::new()
        .route("/resume", get(get_resume::<R>).put(put_resume::<R>))
        .with_state(ResumeState {
            auth,
            store: Arc::new(store),
        })
}

async fn get_resume<R: ResumeStore>(
    State(state): State<ResumeState<R>>,
    user: AuthUser,
) -> Result<Response, AuthError> {
    let owner = OwnerEmail(user.identity.email);
    let record = state.store.find(&owner).await.map_err(store_error)?;

    Ok(match record {
        Some(record) => Json(record).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

async fn put_resume<R: ResumeStore>(
    State(state): State<ResumeState<R>>,
    user: AuthUser,
    Json(data): Json<ResumeData>,
) -> Result<Json<ResumeRecord>, AuthError> {
    let record = ResumeRecord::entered(OwnerEmail(user.identity.email), data);

    state.store.save(record.clone()).await.map_err(|e| {
        tracing::error!(error = %e, "Résumé save failed");
        store_error(e)
    })?;
    tracing::info!(session_id = %user.session_id, "Résumé saved");

    Ok(Json(record))
}
