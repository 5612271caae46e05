use std::collections::HashMap;

use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use super::traits::{SessionStore, StoreError};
use crate::resume::{ResumeRecord, ResumeStore};
use crate::session::Session;
use crate::types::{OwnerEmail, SessionId};

const DEFAULT_TTL: Duration = Duration::days(30);
const DEFAULT_ANONYMOUS_TTL: Duration = Duration::hours(1);

#[derive(Debug)]
struct Entry {
    session: Session,
    expires_at: OffsetDateTime,
}

/// Process-local session store. Sessions vanish on restart.
///
/// Each save restarts the entry's lifetime: `ttl` for authenticated sessions,
/// `anonymous_ttl` for the rest. Expired entries are never returned and are
/// purged on the next save.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Entry>>,
    ttl: Duration,
    anonymous_ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self {
            sessions: RwLock::default(),
            ttl: DEFAULT_TTL,
            anonymous_ttl: DEFAULT_ANONYMOUS_TTL,
        }
    }
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime of authenticated sessions (default: 30 days).
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Lifetime of sessions that have not signed in (default: 1 hour).
    #[must_use]
    pub fn with_anonymous_ttl(mut self, ttl: Duration) -> Self {
        self.anonymous_ttl = ttl;
        self
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &SessionId) -> Result<Option<Session>, StoreError> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.session.clone()))
    }

    async fn save(&self, session_id: &SessionId, session: &Session) -> Result<(), StoreError> {
        let now = OffsetDateTime::now_utc();
        let ttl = if session.is_authenticated() {
            self.ttl
        } else {
            self.anonymous_ttl
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            session_id.clone(),
            Entry {
                session: session.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

/// Process-local résumé store, one record per owner.
#[derive(Debug, Default)]
pub struct MemoryResumeStore {
    records: RwLock<HashMap<OwnerEmail, ResumeRecord>>,
}

impl MemoryResumeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResumeStore for MemoryResumeStore {
    async fn save(&self, record: ResumeRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.owner_email.clone(), record);
        Ok(())
    }

    async fn find(&self, owner: &OwnerEmail) -> Result<Option<ResumeRecord>, StoreError> {
        Ok(self.records.read().await.get(owner).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::UserIdentity;
    use crate::resume::ResumeData;

    #[tokio::test]
    async fn session_save_load_delete() {
        let store = MemorySessionStore::new();
        let id = SessionId::generate();
        let mut session = Session::new();
        session.authenticate(UserIdentity::new("a@b.com"));

        store.save(&id, &session).await.unwrap();
        assert_eq!(store.load(&id).await.unwrap(), Some(session));
        assert_eq!(store.len().await, 1);

        store.delete(&id).await.unwrap();
        assert_eq!(store.load(&id).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn expired_sessions_are_not_returned() {
        let store = MemorySessionStore::new().with_anonymous_ttl(Duration::ZERO);
        let id = SessionId::generate();

        store.save(&id, &Session::new()).await.unwrap();

        assert_eq!(store.load(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_purges_expired_sessions() {
        let store = MemorySessionStore::new().with_anonymous_ttl(Duration::ZERO);
        for _ in 0..10 {
            store.save(&SessionId::generate(), &Session::new()).await.unwrap();
        }
        assert_eq!(store.len().await, 1);

        let mut session = Session::new();
        session.authenticate(UserIdentity::new("a@b.com"));
        let id = SessionId::generate();
        store.save(&id, &session).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.load(&id).await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn resume_save_replaces_previous() {
        let store = MemoryResumeStore::new();
        let owner = OwnerEmail("a@b.com".into());
        let mut data = ResumeData::default();
        data.skills = vec!["Rust".into()];

        store
            .save(ResumeRecord::entered(owner.clone(), ResumeData::default()))
            .await
            .unwrap();
        store
            .save(ResumeRecord::entered(owner.clone(), data.clone()))
            .await
            .unwrap();

        let found = store.find(&owner).await.unwrap().unwrap();
        assert_eq!(found.resume_data, data);
    }
}
