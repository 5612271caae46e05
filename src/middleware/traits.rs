use std::future::Future;
use std::pin::Pin;

use crate::session::Session;
use crate::types::SessionId;

/// Error type returned by consumer-provided stores.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Consumer-provided session persistence.
///
/// Sessions are keyed by opaque [`SessionId`]s generated by the web layer.
/// A render loads the session, runs one transition, and saves it back.
///
/// # Example
///
/// ```rust,ignore
/// impl SessionStore for RedisSessions {
///     async fn load(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
///         let raw: Option<String> = self.conn().get(id.as_str()).await?;
///         Ok(raw.map(|r| serde_json::from_str(&r)).transpose()?)
///     }
///     // save / delete ...
/// }
/// ```
pub trait SessionStore: Send + Sync + 'static {
    /// Look up a session. `None` if the id is unknown or expired.
    fn load(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Insert or replace the session stored under `session_id`.
    fn save(
        &self,
        session_id: &SessionId,
        session: &Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove a session.
    fn delete(&self, session_id: &SessionId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Object-safe wrapper for SessionStore (needed for `Arc<dyn>`).
pub(super) trait SessionStoreDyn: Send + Sync {
    fn load_dyn<'a>(&'a self, session_id: &'a SessionId) -> StoreFuture<'a, Option<Session>>;

    fn save_dyn<'a>(
        &'a self,
        session_id: &'a SessionId,
        session: &'a Session,
    ) -> StoreFuture<'a, ()>;

    fn delete_dyn<'a>(&'a self, session_id: &'a SessionId) -> StoreFuture<'a, ()>;
}

impl<T: SessionStore> SessionStoreDyn for T {
    fn load_dyn<'a>(&'a self, session_id: &'a SessionId) -> StoreFuture<'a, Option<Session>> {
        Box::pin(self.load(session_id))
    }

    fn save_dyn<'a>(
        &'a self,
        session_id: &'a SessionId,
        session: &'a Session,
    ) -> StoreFuture<'a, ()> {
        Box::pin(self.save(session_id, session))
    }

    fn delete_dyn<'a>(&'a self, session_id: &'a SessionId) -> StoreFuture<'a, ()> {
        Box::pin(self.delete(session_id))
    }
}
