#![doc = include_str!("../README.md")]

#[cfg(feature = "oauth")]
pub mod authenticator;
pub mod error;
#[cfg(feature = "middleware")]
pub mod middleware;
pub mod nonce;
#[cfg(feature = "oauth")]
pub mod oauth;
pub mod resume;
#[cfg(feature = "oauth")]
pub mod session;
pub mod types;

// Re-exports for convenient access
#[cfg(feature = "oauth")]
pub use authenticator::{RedirectParams, RenderOutcome, SessionAuthenticator};
pub use error::Error;
pub use nonce::generate_state;
#[cfg(feature = "oauth")]
pub use oauth::{AuthClient, AuthorizationRequest, OAuthConfig, TokenResponse, UserIdentity};
pub use resume::{ParseStatus, ResumeData, ResumeRecord, ResumeStore};
#[cfg(feature = "oauth")]
pub use session::{AuthPhase, Session};
pub use types::{OwnerEmail, SessionId};
