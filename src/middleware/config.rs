use axum_extra::extract::cookie::Key;

use super::error::AuthError;
use crate::authenticator::SessionAuthenticator;
use crate::oauth::{AuthClient, OAuthConfig};

/// Web-layer settings shared by the route handlers and the extractor.
#[derive(Clone)]
pub(crate) struct AuthSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl_days: i64,
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
    pub(crate) login_redirect: String,
    pub(crate) logout_redirect: String,
    pub(crate) error_redirect: String,
}

impl AuthSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "__careerdoc_session".into(),
            session_ttl_days: 30,
            secure_cookies: true,
            auth_path: "/auth".into(),
            login_redirect: "/".into(),
            logout_redirect: "/".into(),
            error_redirect: "/login".into(),
        }
    }
}

/// Web authentication configuration.
///
/// The authenticator is a constructor parameter. Use
/// [`from_env()`](WebAuthConfig::from_env) for convention-based setup, or
/// [`new()`](WebAuthConfig::new) with `with_*` methods for full control.
pub struct WebAuthConfig {
    pub(super) authenticator: SessionAuthenticator,
    pub(super) settings: AuthSettings,
}

impl WebAuthConfig {
    #[must_use]
    pub fn new(authenticator: SessionAuthenticator) -> Self {
        Self {
            authenticator,
            settings: AuthSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// Reads the `OAUTH_*` variables documented on [`OAuthConfig::from_env`], plus:
    /// - `DEV_AUTH`: `"1"` or `"true"` disables secure cookies for plain-http local runs
    /// - `COOKIE_KEY`: cookie encryption key bytes (at least 64); absent means an ephemeral key
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if client credentials are missing or a value is invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let oauth = OAuthConfig::from_lookup(&lookup)?;

        let dev_auth = matches!(lookup("DEV_AUTH").as_deref(), Some("1") | Some("true"));

        let cookie_key = match lookup("COOKIE_KEY") {
            Some(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                AuthError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            None => Key::generate(),
        };

        let authenticator = SessionAuthenticator::new(AuthClient::new(oauth));

        Ok(Self::new(authenticator)
            .with_cookie_key(cookie_key)
            .with_secure_cookies(!dev_auth))
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl_days(mut self, days: i64) -> Self {
        self.settings.session_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_path = path.into();
        self
    }

    #[must_use]
    pub fn with_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.login_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.logout_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_error_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.error_redirect = path.into();
        self
    }
}
