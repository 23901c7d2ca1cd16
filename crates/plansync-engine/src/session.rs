//! Sync session lifecycle.
//!
//! A [`SyncSession`] binds one engine to one live change-feed subscription.
//! The subscription is opened before the initial reconcile so no event can
//! fall into the gap, held for the session's whole lifetime, and released
//! when the session is dropped.

use plansync_core::{Plan, PlanIntent, Result};
use plansync_store::Subscription;
use tracing::{debug, info};

use crate::engine::ReconciliationEngine;
use crate::repository::PlanRepository;

/// One device's live view of the plan collection.
pub struct SyncSession {
    engine: ReconciliationEngine,
    feed: Subscription,
}

impl SyncSession {
    /// Open a session: subscribe to the change feed, then seed local state
    /// with a reconciliation fetch.
    pub async fn open(repo: PlanRepository) -> Result<Self> {
        let feed = repo.subscribe();
        let mut engine = ReconciliationEngine::new(repo);
        engine.reconcile().await?;

        info!(owner = %engine.owner(), plans = engine.snapshot().len(), "sync session opened");

        Ok(Self { engine, feed })
    }

    /// The engine owning this session's state.
    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Mutable access for direct engine operations.
    pub fn engine_mut(&mut self) -> &mut ReconciliationEngine {
        &mut self.engine
    }

    /// Current ordered snapshot.
    pub fn snapshot(&self) -> Vec<Plan> {
        self.engine.snapshot()
    }

    /// Merge every event already queued on the feed, without waiting.
    /// Returns how many were applied.
    pub fn apply_ready_events(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.feed.try_next() {
            debug!(id = %event.plan_id(), kind = ?event.kind, "applying queued change event");
            self.engine.apply_remote_event(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next change event and merge it. Returns `false` once the
    /// feed is closed.
    pub async fn next_change(&mut self) -> bool {
        match self.feed.next().await {
            Some(event) => {
                self.engine.apply_remote_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply queued remote events, then dispatch one user intent.
    pub async fn dispatch(&mut self, intent: PlanIntent) -> Result<()> {
        self.apply_ready_events();
        self.engine.dispatch(intent).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use plansync_store::MemoryStore;
    use uuid::Uuid;

    use super::*;

    fn owner_repo(store: &Arc<MemoryStore>) -> PlanRepository {
        let store: Arc<dyn plansync_store::RemoteStore> = store.clone();
        PlanRepository::new(store, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_open_seeds_from_store() {
        let store = Arc::new(MemoryStore::new());
        let repo = owner_repo(&store);

        repo.insert(plansync_core::PlanDraft {
            title: "already there".to_string(),
            description: String::new(),
            progress: 0,
            order: 0,
        })
        .await
        .unwrap();

        let session = SyncSession::open(repo).await.unwrap();
        assert_eq!(session.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_changes_propagate_between_sessions() {
        let store = Arc::new(MemoryStore::new());
        let repo = owner_repo(&store);

        let mut device_a = SyncSession::open(repo.clone()).await.unwrap();
        let mut device_b = SyncSession::open(repo).await.unwrap();

        device_a
            .dispatch(PlanIntent::Add {
                title: "shared goal".to_string(),
                description: String::new(),
                progress: 0,
            })
            .await
            .unwrap();

        assert!(device_b.next_change().await);
        assert_eq!(device_b.snapshot().len(), 1);
        assert_eq!(device_b.snapshot()[0].title, "shared goal");
    }

    #[tokio::test]
    async fn test_own_echo_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let mut session = SyncSession::open(owner_repo(&store)).await.unwrap();

        session
            .dispatch(PlanIntent::Add {
                title: "echoed".to_string(),
                description: String::new(),
                progress: 0,
            })
            .await
            .unwrap();

        // The store echoed our own insert back to us; merging it must not
        // duplicate the entry.
        assert_eq!(session.apply_ready_events(), 1);
        assert_eq!(session.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_delete_applies_on_pump() {
        let store = Arc::new(MemoryStore::new());
        let repo = owner_repo(&store);

        let mut session = SyncSession::open(repo.clone()).await.unwrap();
        session
            .dispatch(PlanIntent::Add {
                title: "short lived".to_string(),
                description: String::new(),
                progress: 0,
            })
            .await
            .unwrap();
        let id = session.snapshot()[0].id;

        // Another client deletes it directly through the store.
        repo.delete(id).await.unwrap();

        session.apply_ready_events();
        assert!(session.snapshot().is_empty());
    }
}
