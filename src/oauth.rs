use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// `OAuth2` client configuration for the identity provider.
///
/// Required fields are constructor parameters; everything else defaults to
/// Google's endpoints and an offline, consent-prompting sign-in.
///
/// ```rust,ignore
/// use careerdoc_auth::OAuthConfig;
///
/// let config = OAuthConfig::new("client-id", "client-secret", "https://app.example.com/auth/callback".parse()?)
///     .with_prompt(None)
///     .with_timeout(std::time::Duration::from_secs(3));
/// ```
#[derive(Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) redirect_uri: Url,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) userinfo_url: Url,
    pub(crate) scopes: Vec<String>,
    pub(crate) access_type: String,
    pub(crate) prompt: Option<String>,
    pub(crate) include_granted_scopes: Option<bool>,
    pub(crate) timeout: Duration,
}

impl OAuthConfig {
    /// Create a new configuration from the three client credentials.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
            auth_url: DEFAULT_AUTH_URL.parse().expect("valid default URL"),
            token_url: DEFAULT_TOKEN_URL.parse().expect("valid default URL"),
            userinfo_url: DEFAULT_USERINFO_URL.parse().expect("valid default URL"),
            scopes: vec!["openid".into(), "email".into(), "profile".into()],
            access_type: "offline".into(),
            prompt: Some("consent".into()),
            include_granted_scopes: Some(true),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Required env vars
    /// - `OAUTH_CLIENT_ID`
    /// - `OAUTH_CLIENT_SECRET`
    /// - `OAUTH_REDIRECT_URI`: callback URI (must be a valid URL)
    ///
    /// # Optional env vars
    /// - `OAUTH_AUTH_URL`, `OAUTH_TOKEN_URL`, `OAUTH_USERINFO_URL`: endpoint overrides
    /// - `OAUTH_SCOPES`: comma-separated scopes
    /// - `OAUTH_ACCESS_TYPE`: `online` or `offline`
    /// - `OAUTH_PROMPT`: provider prompt mode; empty disables it
    /// - `OAUTH_TIMEOUT_SECS`: outbound request timeout
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] if a credential is absent or empty, or
    /// [`Error::ConfigInvalid`] if a URL or number does not parse.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(Error::ConfigMissing(name))
        };
        let parse_url = |name: &'static str, raw: String| {
            raw.parse::<Url>().map_err(|e| Error::ConfigInvalid {
                name,
                detail: e.to_string(),
            })
        };

        let client_id = required("OAUTH_CLIENT_ID")?;
        let client_secret = required("OAUTH_CLIENT_SECRET")?;
        let redirect_uri = parse_url("OAUTH_REDIRECT_URI", required("OAUTH_REDIRECT_URI")?)?;

        let mut config = Self::new(client_id, client_secret, redirect_uri);

        if let Some(raw) = lookup("OAUTH_AUTH_URL") {
            config = config.with_auth_url(parse_url("OAUTH_AUTH_URL", raw)?);
        }
        if let Some(raw) = lookup("OAUTH_TOKEN_URL") {
            config = config.with_token_url(parse_url("OAUTH_TOKEN_URL", raw)?);
        }
        if let Some(raw) = lookup("OAUTH_USERINFO_URL") {
            config = config.with_userinfo_url(parse_url("OAUTH_USERINFO_URL", raw)?);
        }
        if let Some(scopes) = lookup("OAUTH_SCOPES") {
            config = config.with_scopes(
                scopes
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        if let Some(access_type) = lookup("OAUTH_ACCESS_TYPE") {
            config = config.with_access_type(access_type);
        }
        if let Some(prompt) = lookup("OAUTH_PROMPT") {
            let prompt = prompt.trim().to_string();
            config = config.with_prompt((!prompt.is_empty()).then_some(prompt));
        }
        if let Some(raw) = lookup("OAUTH_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|e| Error::ConfigInvalid {
                name: "OAUTH_TIMEOUT_SECS",
                detail: format!("{e}"),
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Override the authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Override the identity (userinfo) endpoint.
    #[must_use]
    pub fn with_userinfo_url(mut self, url: Url) -> Self {
        self.userinfo_url = url;
        self
    }

    /// Override the scopes (default: `["openid", "email", "profile"]`).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn with_access_type(mut self, access_type: impl Into<String>) -> Self {
        self.access_type = access_type.into();
        self
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        self.prompt = prompt;
        self
    }

    #[must_use]
    pub fn with_include_granted_scopes(mut self, include: Option<bool>) -> Self {
        self.include_granted_scopes = include;
        self
    }

    /// Bound applied to each outbound request (default: 5 seconds).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    #[must_use]
    pub fn userinfo_url(&self) -> &Url {
        &self.userinfo_url
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check that both client credentials are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] naming the first empty credential.
    pub fn ensure_credentials(&self) -> Result<(), Error> {
        if self.client_id.trim().is_empty() {
            return Err(Error::ConfigMissing("client_id"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(Error::ConfigMissing("client_secret"));
        }
        Ok(())
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("auth_url", &self.auth_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("userinfo_url", &self.userinfo_url.as_str())
            .field("scopes", &self.scopes)
            .field("access_type", &self.access_type)
            .field("prompt", &self.prompt)
            .field("include_granted_scopes", &self.include_granted_scopes)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Parameters of one authorization redirect, before serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub response_type: String,
    pub scope: String,
    pub access_type: String,
    pub state: Option<String>,
    pub prompt: Option<String>,
    pub include_granted_scopes: Option<bool>,
}

impl AuthorizationRequest {
    /// Serialize onto `endpoint`'s query string. Every value is form-urlencoded.
    #[must_use]
    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("response_type", &self.response_type)
                .append_pair("scope", &self.scope)
                .append_pair("access_type", &self.access_type);
            if let Some(state) = &self.state {
                pairs.append_pair("state", state);
            }
            if let Some(prompt) = &self.prompt {
                pairs.append_pair("prompt", prompt);
            }
            if let Some(include) = self.include_granted_scopes {
                pairs.append_pair("include_granted_scopes", if include { "true" } else { "false" });
            }
        }
        url
    }

    /// Recover the request from a serialized authorization URL.
    ///
    /// Returns `None` if a required parameter is absent.
    #[must_use]
    pub fn from_url(url: &Url) -> Option<Self> {
        let mut client_id = None;
        let mut redirect_uri = None;
        let mut response_type = None;
        let mut scope = None;
        let mut access_type = None;
        let mut state = None;
        let mut prompt = None;
        let mut include_granted_scopes = None;

        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            match key.as_ref() {
                "client_id" => client_id = Some(value),
                "redirect_uri" => redirect_uri = Some(value),
                "response_type" => response_type = Some(value),
                "scope" => scope = Some(value),
                "access_type" => access_type = Some(value),
                "state" => state = Some(value),
                "prompt" => prompt = Some(value),
                "include_granted_scopes" => include_granted_scopes = value.parse().ok(),
                _ => {}
            }
        }

        Some(Self {
            client_id: client_id?,
            redirect_uri: redirect_uri?,
            response_type: response_type?,
            scope: scope?,
            access_type: access_type?,
            state,
            prompt,
            include_granted_scopes,
        })
    }
}

/// Token endpoint response. Used once to fetch the identity, then dropped.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Identity of the signed-in user, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserIdentity {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl UserIdentity {
    /// Create an identity with only the required `email`.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            sub: None,
            name: None,
            given_name: None,
            family_name: None,
            picture: None,
            email_verified: None,
            locale: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_sub(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }
}

/// Raw userinfo payload; `email` is checked before it becomes a [`UserIdentity`].
#[derive(Deserialize)]
struct UserInfoPayload {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    locale: Option<String>,
}

impl TryFrom<UserInfoPayload> for UserIdentity {
    type Error = Error;

    fn try_from(payload: UserInfoPayload) -> Result<Self, Self::Error> {
        let email = payload
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| Error::IdentityFetchFailed {
                status: None,
                detail: "response is missing the email field".into(),
            })?;
        Ok(Self {
            email,
            sub: payload.sub,
            name: payload.name,
            given_name: payload.given_name,
            family_name: payload.family_name,
            picture: payload.picture,
            email_verified: payload.email_verified,
            locale: payload.locale,
        })
    }
}

/// `OAuth2` authorization-code client.
pub struct AuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl AuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Assemble the authorization request for an optional `state` nonce.
    #[must_use]
    pub fn authorization_request(&self, state: Option<&str>) -> AuthorizationRequest {
        AuthorizationRequest {
            client_id: self.config.client_id.clone(),
            redirect_uri: self.config.redirect_uri.to_string(),
            response_type: "code".into(),
            scope: self.config.scopes.join(" "),
            access_type: self.config.access_type.clone(),
            state: state.map(str::to_owned),
            prompt: self.config.prompt.clone(),
            include_granted_scopes: self.config.include_granted_scopes,
        }
    }

    /// Build the provider authorization URL. Pure: same input, same URL.
    #[must_use]
    pub fn build_authorization_url(&self, state: Option<&str>) -> Url {
        self.authorization_request(state).to_url(&self.config.auth_url)
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] if a credential is empty, and
    /// [`Error::TokenExchangeFailed`] on a non-success status (with the
    /// provider's body), a transport error, a timeout, or an undecodable body.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<TokenResponse, Error> {
        self.config.ensure_credentials()?;

        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .timeout(self.config.timeout)
            .form(&params)
            .send()
            .await
            .map_err(token_failure)?;

        let response = ensure_success(response)
            .await
            .map_err(|(status, body)| Error::TokenExchangeFailed {
                status: Some(status),
                body,
            })?;
        response.json::<TokenResponse>().await.map_err(token_failure)
    }

    /// Fetch the signed-in user's identity with a bearer access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdentityFetchFailed`] on a non-success status, a
    /// transport error, a timeout, an undecodable body, or a missing `email`.
    pub async fn fetch_user_identity(&self, access_token: &str) -> Result<UserIdentity, Error> {
        let response = self
            .http
            .get(self.config.userinfo_url.clone())
            .timeout(self.config.timeout)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(identity_failure)?;

        let response = ensure_success(response)
            .await
            .map_err(|(status, detail)| Error::IdentityFetchFailed {
                status: Some(status),
                detail,
            })?;
        let payload = response
            .json::<UserInfoPayload>()
            .await
            .map_err(identity_failure)?;
        UserIdentity::try_from(payload)
    }
}

/// Returns the response on success, otherwise its status and body text.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, (u16, String)> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err((status, body))
}

fn token_failure(e: reqwest::Error) -> Error {
    Error::TokenExchangeFailed {
        status: e.status().map(|s| s.as_u16()),
        body: e.to_string(),
    }
}

fn identity_failure(e: reqwest::Error) -> Error {
    Error::IdentityFetchFailed {
        status: e.status().map(|s| s.as_u16()),
        detail: e.to_string(),
    }
}
