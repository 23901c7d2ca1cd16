//! In-memory store implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use plansync_core::{ChangeEvent, ChangeKind, Plan, PlanDraft, PlanPatch, StoreError};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::RemoteStore;
use crate::subscription::{ChangeHub, Subscription};

/// In-memory implementation of [`RemoteStore`].
///
/// Backs tests and single-machine sessions. It applies the same contract as a
/// production store: owner scoping on every record operation and one echoed
/// change event per committed mutation.
pub struct MemoryStore {
    /// All records, across owners.
    plans: RwLock<HashMap<Uuid, Plan>>,

    /// The live change feed.
    hub: ChangeHub,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
            hub: ChangeHub::default(),
        }
    }

    /// Number of records currently stored, across all owners.
    pub async fn len(&self) -> usize {
        self.plans.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.plans.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list(&self, owner: Uuid) -> Result<Vec<Plan>, StoreError> {
        let plans = self.plans.read().await;

        let mut owned: Vec<Plan> = plans
            .values()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.display_cmp(b));

        Ok(owned)
    }

    async fn insert(&self, owner: Uuid, draft: PlanDraft) -> Result<Plan, StoreError> {
        let plan = Plan {
            id: Uuid::new_v4(),
            owner,
            title: draft.title,
            description: draft.description,
            progress: draft.progress,
            order: draft.order,
            created_at: Utc::now(),
        };

        let mut plans = self.plans.write().await;
        plans.insert(plan.id, plan.clone());

        self.hub
            .publish(ChangeEvent::now(ChangeKind::Insert, plan.clone()));

        Ok(plan)
    }

    async fn update(&self, id: Uuid, patch: PlanPatch) -> Result<Plan, StoreError> {
        let mut plans = self.plans.write().await;

        let plan = plans
            .get_mut(&id)
            .ok_or_else(|| StoreError::new(format!("plan {id} not found")))?;
        patch.apply_to(plan);
        let updated = plan.clone();

        self.hub
            .publish(ChangeEvent::now(ChangeKind::Update, updated.clone()));

        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut plans = self.plans.write().await;

        let removed = plans
            .remove(&id)
            .ok_or_else(|| StoreError::new(format!("plan {id} not found")))?;

        self.hub
            .publish(ChangeEvent::now(ChangeKind::Delete, removed));

        Ok(())
    }

    fn subscribe(&self, owner: Uuid) -> Subscription {
        self.hub.subscribe(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, order: i64) -> PlanDraft {
        PlanDraft {
            title: title.to_string(),
            description: String::new(),
            progress: 0,
            order,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_identity() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let plan = store.insert(owner, draft("learn piano", 0)).await.unwrap();

        assert_eq!(plan.owner, owner);
        assert_eq!(plan.title, "learn piano");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_and_ordered() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        store.insert(owner, draft("second", 5)).await.unwrap();
        store.insert(owner, draft("first", 1)).await.unwrap();
        store
            .insert(Uuid::new_v4(), draft("not mine", 0))
            .await
            .unwrap();

        let listed = store.list(owner).await.unwrap();
        let titles: Vec<&str> = listed.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let store = MemoryStore::new();
        let result = store.update(Uuid::new_v4(), PlanPatch::order(3)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mutations_echo_to_feed() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let mut sub = store.subscribe(owner);

        let plan = store.insert(owner, draft("run 5k", 0)).await.unwrap();
        store
            .update(plan.id, PlanPatch { progress: Some(20), ..Default::default() })
            .await
            .unwrap();
        store.delete(plan.id).await.unwrap();

        assert_eq!(sub.next().await.unwrap().kind, ChangeKind::Insert);
        let update = sub.next().await.unwrap();
        assert_eq!(update.kind, ChangeKind::Update);
        assert_eq!(update.record.progress, 20);
        assert_eq!(sub.next().await.unwrap().kind, ChangeKind::Delete);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails() {
        let store = MemoryStore::new();
        assert!(store.delete(Uuid::new_v4()).await.is_err());
    }
}
