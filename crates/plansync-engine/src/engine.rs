//! The reconciliation engine.
//!
//! Owns the canonical in-memory ordered collection of plans. All mutation
//! flows through the `&mut self` operations below, so changes land in the
//! order their store calls complete - there is no locking and no parallel
//! mutation of the same entry.
//!
//! Merge rules for the three input streams:
//! - User intents apply optimistically, before the store confirms.
//! - Feed events merge idempotently by id; an event for the actively edited
//!   plan is held until the edit commits or is cancelled.
//! - A reconciliation fetch replaces local state wholesale and is the
//!   recovery path whenever local and remote may have diverged.

use std::collections::HashSet;

use chrono::Utc;
use plansync_core::{
    clamp_progress, ChangeEvent, ChangeKind, EditRequest, Plan, PlanDraft, PlanError, PlanIntent,
    PlanPatch, Result, MAX_PROGRESS,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::repository::PlanRepository;

/// Lifecycle state of one collection entry.
///
/// `Provisional` entries exist only between an add intent and its insert
/// resolving; deletion removes the entry outright, it is never tombstoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    /// Locally created, awaiting a store-assigned identity.
    Provisional,
    /// Confirmed by the store.
    Confirmed,
}

#[derive(Debug, Clone)]
struct Entry {
    plan: Plan,
    state: EntryState,
}

/// Aggregate numbers for the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub total: usize,
    pub completed: usize,
    pub average_progress: u8,
}

/// The client-side reconciliation engine.
pub struct ReconciliationEngine {
    repo: PlanRepository,

    /// The canonical collection, kept sorted in display order.
    entries: Vec<Entry>,

    /// Plan currently under local edit, if any. At most one at a time.
    active_edit: Option<Uuid>,

    /// Remote update held back because its plan is under active edit.
    /// Only the latest one matters; earlier holds are superseded.
    deferred: Option<ChangeEvent>,
}

impl ReconciliationEngine {
    /// Create an engine with an empty collection.
    pub fn new(repo: PlanRepository) -> Self {
        Self {
            repo,
            entries: Vec::new(),
            active_edit: None,
            deferred: None,
        }
    }

    /// The principal this engine's state belongs to.
    pub fn owner(&self) -> Uuid {
        self.repo.owner()
    }

    /// Read-only snapshot of the collection in display order.
    pub fn snapshot(&self) -> Vec<Plan> {
        self.entries.iter().map(|e| e.plan.clone()).collect()
    }

    /// Whether the given plan is still awaiting store confirmation.
    pub fn is_pending(&self, id: Uuid) -> bool {
        self.entries
            .iter()
            .any(|e| e.plan.id == id && e.state == EntryState::Provisional)
    }

    /// Plan currently under active edit, if any.
    pub fn active_edit(&self) -> Option<Uuid> {
        self.active_edit
    }

    /// Aggregate totals over the current snapshot.
    pub fn stats(&self) -> PlanStats {
        let total = self.entries.len();
        let completed = self.entries.iter().filter(|e| e.plan.is_complete()).count();
        let average_progress = if total == 0 {
            0
        } else {
            let sum: u64 = self.entries.iter().map(|e| u64::from(e.plan.progress)).sum();
            ((sum as f64 / total as f64).round() as u8).min(MAX_PROGRESS)
        };

        PlanStats {
            total,
            completed,
            average_progress,
        }
    }

    /// Dispatch one presentation-layer intent.
    pub async fn dispatch(&mut self, intent: PlanIntent) -> Result<()> {
        match intent {
            PlanIntent::Add {
                title,
                description,
                progress,
            } => self.add(&title, &description, progress).await.map(|_| ()),
            PlanIntent::BeginEdit { id } => self.begin_edit(id),
            PlanIntent::Edit { id, fields } => self.edit(id, fields).await.map(|_| ()),
            PlanIntent::CancelEdit => {
                self.cancel_edit();
                Ok(())
            }
            PlanIntent::Delete { id } => self.delete(id).await,
            PlanIntent::Reorder { sequence } => self.reorder(sequence).await,
        }
    }

    /// Create a new plan at the end of the list.
    ///
    /// The plan appears immediately as a provisional entry; on confirmation it
    /// is replaced in place so the list does not flicker, and on failure it is
    /// removed again.
    pub async fn add(&mut self, title: &str, description: &str, progress: i64) -> Result<Plan> {
        let title = title.trim();
        if title.is_empty() {
            return Err(PlanError::validation("title must not be empty"));
        }

        let draft = PlanDraft {
            title: title.to_string(),
            description: description.to_string(),
            progress: clamp_progress(progress),
            order: self.next_order(),
        };

        let provisional_id = Uuid::new_v4();
        self.entries.push(Entry {
            plan: Plan {
                id: provisional_id,
                owner: self.repo.owner(),
                title: draft.title.clone(),
                description: draft.description.clone(),
                progress: draft.progress,
                order: draft.order,
                created_at: Utc::now(),
            },
            state: EntryState::Provisional,
        });
        self.sort_entries();

        match self.repo.insert(draft).await {
            Ok(confirmed) => {
                if let Some(pos) = self.position(provisional_id) {
                    self.entries[pos] = Entry {
                        plan: confirmed.clone(),
                        state: EntryState::Confirmed,
                    };
                }
                Ok(confirmed)
            }
            Err(err) => {
                self.entries.retain(|e| e.plan.id != provisional_id);
                Err(err.into())
            }
        }
    }

    /// Mark a plan as under active edit. While the edit is active, remote
    /// updates for the plan are held back so the user's in-progress values
    /// are never clobbered mid-edit.
    pub fn begin_edit(&mut self, id: Uuid) -> Result<()> {
        if self.position(id).is_none() {
            return Err(PlanError::validation(format!("no plan with id {id}")));
        }
        if self.active_edit.is_some_and(|current| current != id) {
            self.cancel_edit();
        }
        self.active_edit = Some(id);
        Ok(())
    }

    /// Abandon the active edit. A remote update held back during the edit is
    /// applied now, as if it had just arrived.
    pub fn cancel_edit(&mut self) {
        self.active_edit = None;
        if let Some(event) = self.deferred.take() {
            self.apply_remote_event(event);
        }
    }

    /// Commit field changes to a plan.
    ///
    /// Applies optimistically, then issues the update. On failure the edited
    /// values are kept (fail-open, no rollback); the caller decides whether to
    /// retry, discard, or reconcile.
    pub async fn edit(&mut self, id: Uuid, fields: EditRequest) -> Result<Plan> {
        if let Some(title) = &fields.title {
            if title.trim().is_empty() {
                return Err(PlanError::validation("title must not be empty"));
            }
        }
        let pos = self
            .position(id)
            .ok_or_else(|| PlanError::validation(format!("no plan with id {id}")))?;

        let patch = PlanPatch {
            title: fields.title.map(|t| t.trim().to_string()),
            description: fields.description,
            progress: fields.progress.map(clamp_progress),
            order: None,
        };
        patch.apply_to(&mut self.entries[pos].plan);

        // Committing ends the edit. A held remote update is discarded: this
        // commit is the newer write under last-writer-wins, and the store
        // will echo it back anyway.
        if self.active_edit == Some(id) {
            self.active_edit = None;
            self.deferred = None;
        }

        match self.repo.update(id, patch).await {
            Ok(updated) => {
                if let Some(pos) = self.position(id) {
                    self.entries[pos].plan = updated.clone();
                    self.entries[pos].state = EntryState::Confirmed;
                    self.sort_entries();
                }
                Ok(updated)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a plan.
    ///
    /// The entry disappears locally at once. If the store delete fails the
    /// entry stays absent and the error is surfaced; the next reconcile or
    /// remote event corrects any divergence.
    pub async fn delete(&mut self, id: Uuid) -> Result<()> {
        self.clear_edit_state(id);
        self.entries.retain(|e| e.plan.id != id);

        self.repo.delete(id).await?;
        Ok(())
    }

    /// Replace the manual ordering with the given id sequence.
    ///
    /// The sequence must be an exact permutation of the current id set. Each
    /// plan gets `order` = its 0-based position, written back one update per
    /// plan; the first failed write stops the batch, triggers an automatic
    /// reconcile, and is returned to the caller.
    pub async fn reorder(&mut self, sequence: Vec<Uuid>) -> Result<()> {
        if sequence.len() != self.entries.len() {
            return Err(PlanError::validation(format!(
                "reorder sequence has {} ids but the collection has {}",
                sequence.len(),
                self.entries.len()
            )));
        }
        let requested: HashSet<Uuid> = sequence.iter().copied().collect();
        let current: HashSet<Uuid> = self.entries.iter().map(|e| e.plan.id).collect();
        if requested.len() != sequence.len() || requested != current {
            return Err(PlanError::validation(
                "reorder sequence is not a permutation of the current plans",
            ));
        }

        for (index, id) in sequence.iter().enumerate() {
            if let Some(pos) = self.position(*id) {
                self.entries[pos].plan.order = index as i64;
            }
        }
        self.sort_entries();

        for (index, id) in sequence.iter().enumerate() {
            if let Err(err) = self.repo.update(*id, PlanPatch::order(index as i64)).await {
                warn!(%id, "reorder write failed, pulling authoritative order");
                if let Err(refetch) = self.reconcile().await {
                    warn!(error = %refetch, "reconcile after failed reorder also failed");
                }
                return Err(err.into());
            }
        }

        Ok(())
    }

    /// Merge one change-feed event into the collection.
    ///
    /// Never fails: events for unknown ids are swallowed, and the store's
    /// echo of this client's own mutations merges as a no-op.
    pub fn apply_remote_event(&mut self, event: ChangeEvent) {
        let id = event.plan_id();
        match event.kind {
            ChangeKind::Insert => {
                match self.position(id) {
                    // Already present (our own echo): replace in place.
                    Some(pos) => {
                        self.entries[pos] = Entry {
                            plan: event.record,
                            state: EntryState::Confirmed,
                        };
                    }
                    None => {
                        self.entries.push(Entry {
                            plan: event.record,
                            state: EntryState::Confirmed,
                        });
                    }
                }
                self.sort_entries();
            }
            ChangeKind::Update => {
                if self.active_edit == Some(id) {
                    debug!(%id, "holding remote update while edit is active");
                    self.deferred = Some(event);
                    return;
                }
                match self.position(id) {
                    Some(pos) => {
                        self.entries[pos].plan = event.record;
                        self.entries[pos].state = EntryState::Confirmed;
                        self.sort_entries();
                    }
                    None => debug!(%id, "update for unknown plan ignored"),
                }
            }
            ChangeKind::Delete => {
                // The record is gone remotely; an in-progress edit of it
                // cannot be committed, so the edit state goes with it.
                self.clear_edit_state(id);
                let before = self.entries.len();
                self.entries.retain(|e| e.plan.id != id);
                if self.entries.len() == before {
                    debug!(%id, "delete for absent plan ignored");
                }
            }
        }
    }

    /// Replace local state wholesale from the authoritative store list.
    pub async fn reconcile(&mut self) -> Result<()> {
        let plans = self.repo.fetch_all().await?;

        self.entries = plans
            .into_iter()
            .map(|plan| Entry {
                plan,
                state: EntryState::Confirmed,
            })
            .collect();
        self.sort_entries();
        self.deferred = None;
        if let Some(id) = self.active_edit {
            if self.position(id).is_none() {
                self.active_edit = None;
            }
        }

        Ok(())
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.entries.iter().position(|e| e.plan.id == id)
    }

    fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| a.plan.display_cmp(&b.plan));
    }

    /// Next `order` value: strictly above the current maximum, 0 when empty.
    fn next_order(&self) -> i64 {
        self.entries
            .iter()
            .map(|e| e.plan.order)
            .max()
            .map_or(0, |max| max + 1)
    }

    fn clear_edit_state(&mut self, id: Uuid) {
        if self.active_edit == Some(id) {
            self.active_edit = None;
            self.deferred = None;
        }
    }
}
