//! # Plansync Core
//!
//! Core primitives for the plansync reconciliation system.
//!
//! This crate provides the fundamental building blocks:
//! - [`Plan`] - A single goal-tracking record
//! - [`ChangeEvent`] - One notification from the live change feed
//! - [`PlanIntent`] - A user gesture translated into an engine intent
//! - [`PlanError`] - The client-side error taxonomy

pub mod error;
pub mod event;
pub mod intent;
pub mod plan;

// Re-exports for convenience
pub use error::{PlanError, Result, StoreError};
pub use event::{ChangeEvent, ChangeKind};
pub use intent::{EditRequest, PlanIntent};
pub use plan::{clamp_progress, Plan, PlanDraft, PlanPatch, MAX_PROGRESS};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{PlanError, Result, StoreError};
    pub use crate::event::{ChangeEvent, ChangeKind};
    pub use crate::intent::{EditRequest, PlanIntent};
    pub use crate::plan::{clamp_progress, Plan, PlanDraft, PlanPatch};
}
