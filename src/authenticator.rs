//! Sign-in state machine over a [`Session`].
//!
//! A page load calls [`SessionAuthenticator::render`]. Anonymous sessions get a
//! login URL carrying a fresh `state` nonce; a redirect carrying `code` is
//! exchanged for a token, then an identity, and only when both succeed does the
//! session become authenticated. Failures leave the session untouched.

use serde::Deserialize;
use url::Url;

use crate::error::Error;
use crate::nonce;
use crate::oauth::{AuthClient, UserIdentity};
use crate::session::Session;

/// Query parameters of an inbound request that may be a provider redirect.
///
/// The authenticator takes `code` and `state` out of this value once it has
/// consumed them, so a re-render of the same params cannot replay them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl RedirectParams {
    /// Params of a provider redirect carrying `code` and `state`.
    #[must_use]
    pub fn with_code(code: impl Into<String>, state: Option<&str>) -> Self {
        Self {
            code: Some(code.into()),
            state: state.map(str::to_owned),
            ..Self::default()
        }
    }

    /// True if the provider sent either a code or an error.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Result of evaluating one page load.
#[derive(Debug)]
pub enum RenderOutcome {
    /// The session is (now) authenticated.
    Authenticated(UserIdentity),
    /// Present this URL as the login affordance.
    LoginRequired { authorization_url: Url },
    /// A sign-in attempt failed; the session is as it was before.
    Failed(Error),
}

/// Drives [`Session`] transitions for the authorization-code flow.
pub struct SessionAuthenticator {
    client: AuthClient,
    require_state: bool,
}

impl SessionAuthenticator {
    #[must_use]
    pub fn new(client: AuthClient) -> Self {
        Self {
            client,
            require_state: false,
        }
    }

    /// Whether a redirect is rejected when no nonce is pending for the session
    /// (default: `false`). A pending nonce is always checked.
    #[must_use]
    pub fn with_require_state(mut self, require: bool) -> Self {
        self.require_state = require;
        self
    }

    #[must_use]
    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    /// Evaluate a page load.
    pub async fn render(&self, session: &mut Session, params: &mut RedirectParams) -> RenderOutcome {
        if let Some(identity) = session.identity() {
            params.clear();
            return RenderOutcome::Authenticated(identity.clone());
        }

        if params.is_redirect() {
            return match self.complete_redirect(session, params).await {
                Ok(identity) => RenderOutcome::Authenticated(identity),
                Err(e) => RenderOutcome::Failed(e),
            };
        }

        match self.begin_login(session) {
            Ok(authorization_url) => RenderOutcome::LoginRequired { authorization_url },
            Err(e) => RenderOutcome::Failed(e),
        }
    }

    /// Issue an authorization URL and remember its nonce.
    ///
    /// Each call replaces the pending nonce, so only the latest URL can
    /// complete.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] if client credentials are empty.
    pub fn begin_login(&self, session: &mut Session) -> Result<Url, Error> {
        self.client.config().ensure_credentials().inspect_err(|e| {
            tracing::error!(error = %e, "Cannot issue authorization URL");
        })?;

        let state = nonce::generate_state();
        let url = self.client.build_authorization_url(Some(&state));
        session.await_redirect(state);

        tracing::debug!(endpoint = %self.client.config().auth_url(), "Issued authorization URL");
        Ok(url)
    }

    /// Consume a provider redirect and authenticate the session on success.
    ///
    /// # Errors
    ///
    /// [`Error::ProviderDenied`] if the provider sent `error`,
    /// [`Error::StateMismatch`] if the nonce check fails,
    /// [`Error::ConfigMissing`], [`Error::TokenExchangeFailed`] or
    /// [`Error::IdentityFetchFailed`] from the client. The session is not
    /// modified on error.
    pub async fn complete_redirect(
        &self,
        session: &mut Session,
        params: &mut RedirectParams,
    ) -> Result<UserIdentity, Error> {
        let code = params.code.take();
        let received_state = params.state.take();
        let provider_error = params.error.take();
        let description = params.error_description.take();

        if let Some(error) = provider_error {
            let description = description.unwrap_or_else(|| "no description".into());
            tracing::warn!(error = %error, description = %description, "Provider returned an error redirect");
            return Err(Error::ProviderDenied { error, description });
        }

        let code = code.ok_or_else(|| Error::TokenExchangeFailed {
            status: None,
            body: "redirect carried no authorization code".into(),
        })?;

        self.client.config().ensure_credentials()?;
        self.verify_state(session, received_state.as_deref())?;

        let token = self
            .client
            .exchange_code_for_token(&code)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Token exchange failed"))?;

        let identity = self
            .client
            .fetch_user_identity(&token.access_token)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Identity fetch failed"))?;

        session.authenticate(identity.clone());
        tracing::info!(sub = ?identity.sub, "OAuth2 sign-in successful");

        Ok(identity)
    }

    /// Drop authentication and any pending nonce.
    pub fn logout(&self, session: &mut Session) {
        let was_authenticated = session.is_authenticated();
        session.reset();
        tracing::info!(was_authenticated, "Session logged out");
    }

    fn verify_state(&self, session: &Session, received: Option<&str>) -> Result<(), Error> {
        let ok = match (session.pending_state_token(), received) {
            (Some(issued), Some(received)) => nonce::state_matches(issued, received),
            (Some(_), None) => false,
            (None, _) => !self.require_state,
        };
        if ok {
            Ok(())
        } else {
            tracing::warn!("OAuth state mismatch");
            Err(Error::StateMismatch)
        }
    }
}
