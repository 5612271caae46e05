/// Errors raised by the authorization client and the session authenticator.
///
/// Every variant is recoverable: the authenticator leaves the session as it
/// was and the user can restart the sign-in flow.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The token endpoint rejected the code, timed out, or returned garbage.
    #[error("token exchange failed{}: {body}", status_suffix(.status))]
    TokenExchangeFailed { status: Option<u16>, body: String },

    /// The identity endpoint failed or returned a profile without `email`.
    #[error("identity fetch failed{}: {detail}", status_suffix(.status))]
    IdentityFetchFailed { status: Option<u16>, detail: String },

    /// The redirect `state` does not match the nonce issued with the login URL.
    #[error("state mismatch on authorization redirect")]
    StateMismatch,

    /// The provider redirected back with an `error` instead of a code.
    #[error("provider denied authorization: {error} ({description})")]
    ProviderDenied { error: String, description: String },

    /// A required client credential is absent or empty.
    #[error("missing configuration: {0}")]
    ConfigMissing(&'static str),

    /// A configuration value is present but unusable.
    #[error("invalid configuration {name}: {detail}")]
    ConfigInvalid { name: &'static str, detail: String },
}

impl Error {
    /// Stable short identifier, safe to put in a redirect query string.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenExchangeFailed { .. } => "token_exchange_failed",
            Self::IdentityFetchFailed { .. } => "identity_fetch_failed",
            Self::StateMismatch => "state_mismatch",
            Self::ProviderDenied { .. } => "access_denied",
            Self::ConfigMissing(_) => "config_missing",
            Self::ConfigInvalid { .. } => "config_invalid",
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_when_known() {
        let err = Error::TokenExchangeFailed {
            status: Some(400),
            body: r#"{"error":"invalid_grant"}"#.into(),
        };
        assert_eq!(
            err.to_string(),
            r#"token exchange failed (HTTP 400): {"error":"invalid_grant"}"#
        );
    }

    #[test]
    fn display_omits_status_for_transport_failures() {
        let err = Error::IdentityFetchFailed {
            status: None,
            detail: "operation timed out".into(),
        };
        assert_eq!(err.to_string(), "identity fetch failed: operation timed out");
    }

    #[test]
    fn kinds_are_url_safe() {
        let errors = [
            Error::StateMismatch,
            Error::ConfigMissing("client_id"),
            Error::ProviderDenied {
                error: "access_denied".into(),
                description: "user cancelled".into(),
            },
        ];
        for err in errors {
            assert!(
                err.kind()
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c == '_'),
                "{}",
                err.kind()
            );
        }
    }
}
