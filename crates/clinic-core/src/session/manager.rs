//! Per-sender conversation handling

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::booking::{normalize, transition, Session, Transition};
use crate::session::{InMemorySessionStore, SessionStore};
use crate::Result;

/// Runs inbound messages through the booking state machine
///
/// Messages from the same sender are processed one at a time, so the
/// read-transition-write sequence never interleaves for a single sender.
/// A sender's lock is dropped from the map once no message holds it.
pub struct ConversationManager {
    store: Arc<dyn SessionStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ConversationManager {
    /// Create a manager over the given store
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// Create a manager backed by an `InMemorySessionStore`
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()))
    }

    /// Apply a raw inbound message body and persist the resulting session
    pub async fn handle_message(&self, sender: &str, body: &str) -> Result<Transition> {
        let lock = self.lock_for(sender);
        let result = {
            let _guard = lock.lock().await;
            self.apply(sender, body).await
        };

        drop(lock);
        self.locks.remove_if(sender, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    /// Current session for `sender`
    pub async fn session(&self, sender: &str) -> Result<Session> {
        self.store.get(sender).await
    }

    async fn apply(&self, sender: &str, body: &str) -> Result<Transition> {
        let current = self.store.get(sender).await?;
        let message = normalize(body);
        let next = transition(&current, &message);

        debug!(
            sender,
            from = %current.step(),
            to = %next.session.step(),
            "Booking transition"
        );

        self.store.put(sender, next.session.clone()).await?;
        Ok(next)
    }

    fn lock_for(&self, sender: &str) -> Arc<Mutex<()>> {
        self.locks.entry(sender.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::Step;
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const SENDER: &str = "whatsapp:+15550001111";

    #[tokio::test]
    async fn test_flow_persists_between_messages() {
        let manager = ConversationManager::in_memory();

        let reply = manager.handle_message(SENDER, "Book").await.unwrap();
        assert!(reply.reply.contains("Great! Please choose a doctor"));

        manager.handle_message(SENDER, " 2 ").await.unwrap();
        manager.handle_message(SENDER, "1").await.unwrap();

        let session = manager.session(SENDER).await.unwrap();
        assert_eq!(
            session.step(),
            &Step::AwaitingConfirmation {
                doctor: "Dr. B (Dermatologist)".into(),
                time: "10:00 AM".into(),
            }
        );

        let done = manager.handle_message(SENDER, "CONFIRM").await.unwrap();
        assert!(done.reply.contains("Dr. B (Dermatologist) at 10:00 AM"));
        assert_eq!(manager.session(SENDER).await.unwrap().step().name(), "done");
    }

    #[tokio::test]
    async fn test_senders_are_independent() {
        let manager = ConversationManager::in_memory();
        manager.handle_message("a", "book").await.unwrap();
        manager.handle_message("b", "1").await.unwrap();

        assert_eq!(manager.session("a").await.unwrap().step(), &Step::ChooseDoctor);
        assert_eq!(manager.session("b").await.unwrap().step(), &Step::Start);
        assert!(manager.locks.is_empty());
    }

    /// Store whose reads always fail
    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn get(&self, _sender: &str) -> Result<Session> {
            Err(Error::Store("backend unavailable".to_string()))
        }

        async fn put(&self, _sender: &str, _session: Session) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_error_releases_sender_lock() {
        let manager = ConversationManager::new(Arc::new(BrokenStore));
        let err = manager.handle_message(SENDER, "book").await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(manager.locks.is_empty());
    }

    /// Store that records how many requests are inside get..put at once
    #[derive(Default)]
    struct TrackingStore {
        inner: InMemorySessionStore,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait]
    impl SessionStore for TrackingStore {
        async fn get(&self, sender: &str) -> Result<Session> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.inner.get(sender).await
        }

        async fn put(&self, sender: &str, session: Session) -> Result<()> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.inner.put(sender, session).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_sender_is_serialized() {
        let store = Arc::new(TrackingStore::default());
        let manager = Arc::new(ConversationManager::new(store.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.handle_message(SENDER, "book").await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.max_active.load(Ordering::SeqCst), 1);
        assert!(manager.locks.is_empty());
        assert_eq!(
            manager.session(SENDER).await.unwrap().step(),
            &Step::ChooseDoctor
        );
    }
}
