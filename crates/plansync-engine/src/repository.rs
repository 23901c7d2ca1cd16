//! Plan repository.
//!
//! Thin translation layer between engine intents and the remote store. Each
//! method maps one intent to one store call, scopes it to the session owner,
//! and normalizes the outcome; failures are logged and returned as
//! [`StoreError`], never panics and never a foreign error type.

use std::sync::Arc;

use plansync_core::{Plan, PlanDraft, PlanPatch, StoreError};
use plansync_store::{RemoteStore, Subscription};
use tracing::warn;
use uuid::Uuid;

/// Owner-scoped facade over the remote store.
#[derive(Clone)]
pub struct PlanRepository {
    /// The backing store capability.
    store: Arc<dyn RemoteStore>,

    /// The authenticated principal all calls are scoped to.
    owner: Uuid,
}

impl PlanRepository {
    /// Create a repository scoped to one principal.
    pub fn new(store: Arc<dyn RemoteStore>, owner: Uuid) -> Self {
        Self { store, owner }
    }

    /// The principal this repository is scoped to.
    pub fn owner(&self) -> Uuid {
        self.owner
    }

    /// Fetch the owner's full plan list, sorted by order.
    pub async fn fetch_all(&self) -> Result<Vec<Plan>, StoreError> {
        self.store.list(self.owner).await.map_err(|err| {
            warn!(error = %err, "failed to fetch plans");
            err
        })
    }

    /// Commit a new plan for the owner.
    pub async fn insert(&self, draft: PlanDraft) -> Result<Plan, StoreError> {
        self.store.insert(self.owner, draft).await.map_err(|err| {
            warn!(error = %err, "failed to add plan");
            err
        })
    }

    /// Apply a sparse patch to one plan.
    pub async fn update(&self, id: Uuid, patch: PlanPatch) -> Result<Plan, StoreError> {
        self.store.update(id, patch).await.map_err(|err| {
            warn!(error = %err, %id, "failed to update plan");
            err
        })
    }

    /// Remove one plan.
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.store.delete(id).await.map_err(|err| {
            warn!(error = %err, %id, "failed to delete plan");
            err
        })
    }

    /// Open the owner's live change feed.
    pub fn subscribe(&self) -> Subscription {
        self.store.subscribe(self.owner)
    }
}
