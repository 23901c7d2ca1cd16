//! # Plansync Engine
//!
//! The client-side state reconciliation engine. It owns the canonical
//! in-memory ordered collection of plans and keeps it consistent under three
//! concurrent input streams: optimistic user mutations, echoed change events
//! from the store's live feed, and full-list reconciliation fetches.

pub mod engine;
pub mod repository;
pub mod session;

pub use engine::{PlanStats, ReconciliationEngine};
pub use repository::PlanRepository;
pub use session::SyncSession;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::engine::{PlanStats, ReconciliationEngine};
    pub use crate::repository::PlanRepository;
    pub use crate::session::SyncSession;
    pub use plansync_core::prelude::*;
}
