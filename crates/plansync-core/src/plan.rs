//! Plan entity types.
//!
//! A Plan is the unit record of the system - one goal with a title, a
//! free-text description, a 0-100 progress value, and a manual sort position.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound of the progress range.
pub const MAX_PROGRESS: u8 = 100;

/// Clamp an arbitrary progress input into the 0..=100 range.
///
/// Out-of-range values are accepted and clamped rather than rejected, so a
/// slider or remote record can never produce an invalid stored value.
pub fn clamp_progress(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_PROGRESS)) as u8
}

/// A single goal-tracking record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Store-assigned identifier; provisional entries carry a locally
    /// generated id until the insert is confirmed.
    pub id: Uuid,

    /// The principal that owns this plan. Every store operation is scoped to
    /// the owner; cross-principal access never reaches the client.
    pub owner: Uuid,

    /// Non-empty title, validated client-side before submission.
    pub title: String,

    /// Free-text description, may be empty.
    pub description: String,

    /// Completion percentage, always within 0..=100.
    pub progress: u8,

    /// Manual sequence position. Not required to be contiguous; ties are
    /// broken by `created_at`, then `id`.
    pub order: i64,

    /// Set once by the store at creation, never mutated.
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Display ordering: ascending `order`, with a stable secondary sort so
    /// equal orders never flip between renders.
    pub fn display_cmp(&self, other: &Plan) -> Ordering {
        self.order
            .cmp(&other.order)
            .then(self.created_at.cmp(&other.created_at))
            .then(self.id.cmp(&other.id))
    }

    /// Whether this plan counts as completed.
    pub fn is_complete(&self) -> bool {
        self.progress >= MAX_PROGRESS
    }
}

/// Payload for creating a new plan. The store assigns `id`, `owner`, and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDraft {
    pub title: String,
    pub description: String,
    pub progress: u8,
    pub order: i64,
}

/// Sparse update payload; unset fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl PlanPatch {
    /// A patch that only moves a plan to a new sequence position.
    pub fn order(order: i64) -> Self {
        Self {
            order: Some(order),
            ..Default::default()
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.progress.is_none()
            && self.order.is_none()
    }

    /// Merge this patch into an existing plan.
    pub fn apply_to(&self, plan: &mut Plan) {
        if let Some(title) = &self.title {
            plan.title = title.clone();
        }
        if let Some(description) = &self.description {
            plan.description = description.clone();
        }
        if let Some(progress) = self.progress {
            plan.progress = progress.min(MAX_PROGRESS);
        }
        if let Some(order) = self.order {
            plan.order = order;
        }
    }
}
