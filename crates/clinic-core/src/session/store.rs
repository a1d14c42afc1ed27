//! Session storage backends

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::booking::Session;
use crate::Result;

/// Key-value storage for booking sessions, keyed by sender id
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Session for `sender`, or a fresh `start` session if none was stored
    async fn get(&self, sender: &str) -> Result<Session>;

    /// Store `session` for `sender`, replacing any previous value
    async fn put(&self, sender: &str, session: Session) -> Result<()>;
}

/// In-memory session store, lives as long as the process
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    /// Create a new session store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, sender: &str) -> Result<Session> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(sender).cloned().unwrap_or_default())
    }

    async fn put(&self, sender: &str, session: Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(sender.to_string(), session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::Step;

    #[tokio::test]
    async fn test_get_missing_returns_start_without_storing() {
        let store = InMemorySessionStore::new();
        let session = store.get("whatsapp:+1234567890").await.unwrap();
        assert_eq!(session.step(), &Step::Start);
        assert!(store.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = InMemorySessionStore::new();
        let key = "whatsapp:+1234567890";

        store.put(key, Session::new(Step::ChooseDoctor)).await.unwrap();
        store
            .put(
                key,
                Session::new(Step::ChooseTime {
                    doctor: "Dr. A".into(),
                }),
            )
            .await
            .unwrap();

        let session = store.get(key).await.unwrap();
        assert_eq!(session.doctor(), Some("Dr. A"));
        assert_eq!(store.sessions.read().await.len(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        tokio_test::block_on(async {
            let store = InMemorySessionStore::new();
            let other = store.clone();
            store.put("a", Session::new(Step::ChooseDoctor)).await.unwrap();
            assert_eq!(other.get("a").await.unwrap().step(), &Step::ChooseDoctor);
            assert_eq!(other.get("b").await.unwrap().step(), &Step::Start);
        });
    }
}
