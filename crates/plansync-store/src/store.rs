//! The remote store contract.

use async_trait::async_trait;
use plansync_core::{Plan, PlanDraft, PlanPatch, StoreError};
use uuid::Uuid;

use crate::subscription::Subscription;

/// Capability contract for the backing store.
///
/// The production store lives behind this trait as an external collaborator;
/// the engine consumes the contract and never assumes anything about the
/// persistence schema. All record operations are scoped to the owning
/// principal - the store rejects cross-principal access, and the client never
/// attempts it.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the owner's full plan list, sorted ascending by `order`.
    async fn list(&self, owner: Uuid) -> Result<Vec<Plan>, StoreError>;

    /// Commit a new plan; the store assigns `id` and `created_at`.
    async fn insert(&self, owner: Uuid, draft: PlanDraft) -> Result<Plan, StoreError>;

    /// Apply a sparse patch to an existing plan and return the updated record.
    /// Fails when the id is unknown or not owned by the caller.
    async fn update(&self, id: Uuid, patch: PlanPatch) -> Result<Plan, StoreError>;

    /// Remove a plan. Fails when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Open a live feed of change events for the owner's data scope. The
    /// returned handle unsubscribes when dropped.
    fn subscribe(&self, owner: Uuid) -> Subscription;
}
