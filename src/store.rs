//! Persistence collaborator.
//!
//! The core treats storage as an external service behind [`SessionStore`].
//! Saves are version-checked: the service bumps `Session::version` exactly
//! once per committed operation, and a save whose version does not advance
//! past the stored row is rejected instead of silently losing an update.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{GameError, GameResult};
use crate::types::{Session, SessionId};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> GameResult<Option<Session>>;
    async fn save(&self, session: &Session) -> GameResult<()>;
    async fn exists(&self, id: &str) -> GameResult<bool>;
    async fn delete(&self, id: &str) -> GameResult<()>;
}

/// In-memory reference store
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, id: &str) -> GameResult<Option<Session>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save(&self, session: &Session) -> GameResult<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&session.id) {
            if existing.version >= session.version {
                return Err(GameError::Persistence(format!(
                    "version conflict for session {} (stored {}, saving {})",
                    session.id, existing.version, session.version
                )));
            }
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn exists(&self, id: &str) -> GameResult<bool> {
        Ok(self.sessions.read().await.contains_key(id))
    }

    async fn delete(&self, id: &str) -> GameResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionConfig;

    #[tokio::test]
    async fn round_trips_a_session() {
        let store = MemoryStore::new();
        let mut session = Session::new("ABCDE".into(), SessionConfig::default());
        session.version = 1;

        store.save(&session).await.unwrap();
        assert!(store.exists("ABCDE").await.unwrap());

        let loaded = store.load("ABCDE").await.unwrap().unwrap();
        assert_eq!(loaded, session);

        store.delete("ABCDE").await.unwrap();
        assert!(!store.exists("ABCDE").await.unwrap());
        assert!(store.load("ABCDE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_save_is_rejected() {
        let store = MemoryStore::new();
        let mut session = Session::new("ABCDE".into(), SessionConfig::default());
        session.version = 1;
        store.save(&session).await.unwrap();

        // two writers loaded version 1; the second commit must fail
        let mut first = session.clone();
        first.version = 2;
        store.save(&first).await.unwrap();

        let mut second = session.clone();
        second.version = 2;
        let err = store.save(&second).await.unwrap_err();
        assert!(matches!(err, GameError::Persistence(_)));
    }
}
