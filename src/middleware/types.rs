use serde::Serialize;

use crate::oauth::UserIdentity;
use crate::session::AuthPhase;

/// JSON body of `GET {auth_path}/session`.
///
/// Authenticated sessions carry `identity`; anonymous ones carry the
/// `login_url` the front-end should present.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub authenticated: bool,
    pub phase: AuthPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<UserIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
}
