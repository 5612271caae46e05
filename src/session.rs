use serde::{Deserialize, Serialize};

use crate::oauth::UserIdentity;

/// Where a session stands in the sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    Anonymous,
    /// An authorization URL was issued; no code has come back yet.
    AwaitingRedirect,
    Authenticated,
}

/// Per-user authentication record.
///
/// `identity` is present exactly when `authenticated` is true. Fields are
/// private; only the authenticator's transitions change them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord")]
pub struct Session {
    authenticated: bool,
    identity: Option<UserIdentity>,
    pending_state_token: Option<String>,
}

#[derive(Deserialize)]
struct SessionRecord {
    authenticated: bool,
    identity: Option<UserIdentity>,
    pending_state_token: Option<String>,
}

impl TryFrom<SessionRecord> for Session {
    type Error = &'static str;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        if record.authenticated != record.identity.is_some() {
            return Err("authenticated flag and identity disagree");
        }
        Ok(Self {
            authenticated: record.authenticated,
            identity: record.identity,
            pending_state_token: record.pending_state_token,
        })
    }
}

impl Session {
    /// A fresh, anonymous session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn pending_state_token(&self) -> Option<&str> {
        self.pending_state_token.as_deref()
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        if self.authenticated {
            AuthPhase::Authenticated
        } else if self.pending_state_token.is_some() {
            AuthPhase::AwaitingRedirect
        } else {
            AuthPhase::Anonymous
        }
    }

    pub(crate) fn await_redirect(&mut self, state: String) {
        self.pending_state_token = Some(state);
    }

    pub(crate) fn authenticate(&mut self, identity: UserIdentity) {
        self.authenticated = true;
        self.identity = Some(identity);
        self.pending_state_token = None;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_anonymous() {
        let session = Session::new();
        assert_eq!(session.phase(), AuthPhase::Anonymous);
        assert!(!session.is_authenticated());
        assert!(session.identity().is_none());
    }

    #[test]
    fn authenticate_sets_identity_and_clears_nonce() {
        let mut session = Session::new();
        session.await_redirect("nonce".into());
        assert_eq!(session.phase(), AuthPhase::AwaitingRedirect);

        session.authenticate(UserIdentity::new("a@b.com"));

        assert_eq!(session.phase(), AuthPhase::Authenticated);
        assert_eq!(session.identity().map(|i| i.email.as_str()), Some("a@b.com"));
        assert_eq!(session.pending_state_token(), None);
    }

    #[test]
    fn reset_returns_to_anonymous() {
        let mut session = Session::new();
        session.authenticate(UserIdentity::new("a@b.com"));
        session.reset();

        assert_eq!(session, Session::new());
    }

    #[test]
    fn serde_keeps_invariant_fields() {
        let mut session = Session::new();
        session.authenticate(UserIdentity::new("a@b.com").with_name("A"));

        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, session);
    }

    #[test]
    fn serde_rejects_authenticated_without_identity() {
        let json = r#"{"authenticated":true,"identity":null,"pending_state_token":null}"#;
        assert!(serde_json::from_str::<Session>(json).is_err());
    }
}
