use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Authentication errors for the web layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authenticated session found.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Sign-in flow error outside the callback; answered with `400` and the
    /// error kind. The callback redirects to the configured error page itself.
    #[error("OAuth error: {0}")]
    OAuth(crate::error::Error),

    /// Session or résumé store operation failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()).into_response(),
            Self::OAuth(ref e) => {
                tracing::warn!(error = %e, "Sign-in request rejected");
                (StatusCode::BAD_REQUEST, e.kind()).into_response()
            }
            Self::Store(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl From<crate::error::Error> for AuthError {
    fn from(e: crate::error::Error) -> Self {
        use crate::error::Error;
        match e {
            Error::ConfigMissing(_) | Error::ConfigInvalid { .. } => Self::Config(e.to_string()),
            other => Self::OAuth(other),
        }
    }
}

pub(super) fn store_error(e: Box<dyn std::error::Error + Send + Sync>) -> AuthError {
    AuthError::Store(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn oauth_error_is_bad_request_without_redirect() {
        let response = AuthError::from(Error::StateMismatch).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(axum::http::header::LOCATION).is_none());
    }

    #[test]
    fn config_errors_are_internal() {
        let response = AuthError::from(Error::ConfigMissing("client_id")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthenticated_is_401() {
        let response = AuthError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
