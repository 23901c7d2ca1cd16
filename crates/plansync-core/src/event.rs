//! Change-feed event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::Plan;

/// Kind of change announced by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A new record was committed.
    Insert,
    /// An existing record's fields changed.
    Update,
    /// A record was removed.
    Delete,
}

/// One notification from the live change feed.
///
/// The store echoes every committed mutation to all subscribers of the owning
/// principal, including the client that issued it, so consumers must merge
/// events idempotently by id. Delete events carry the last-known record so the
/// consumer still learns the id and owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened.
    pub kind: ChangeKind,

    /// The affected record; for deletes, its state before removal.
    pub record: Plan,

    /// When the store committed the change.
    pub committed_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Build an event stamped with the current time.
    pub fn now(kind: ChangeKind, record: Plan) -> Self {
        Self {
            kind,
            record,
            committed_at: Utc::now(),
        }
    }

    /// Id of the affected record.
    pub fn plan_id(&self) -> Uuid {
        self.record.id
    }

    /// Owner scope of the affected record.
    pub fn owner(&self) -> Uuid {
        self.record.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Plan {
        Plan {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            title: "read more".to_string(),
            description: String::new(),
            progress: 10,
            order: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_event_accessors() {
        let plan = sample_plan();
        let event = ChangeEvent::now(ChangeKind::Update, plan.clone());
        assert_eq!(event.plan_id(), plan.id);
        assert_eq!(event.owner(), plan.owner);
        assert_eq!(event.kind, ChangeKind::Update);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ChangeKind::Insert).unwrap();
        assert_eq!(json, "\"insert\"");
    }
}
