//! Presentation-boundary intents.
//!
//! The presentation layer never mutates the plan collection directly; every
//! gesture is translated into one of these intents and dispatched through the
//! engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Requested field changes for an edit. Progress is accepted as a raw `i64`
/// and clamped by the engine, matching the add path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub progress: Option<i64>,
}

/// A user gesture expressed as an engine intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanIntent {
    /// Create a new plan at the end of the list.
    Add {
        title: String,
        description: String,
        progress: i64,
    },

    /// Mark a plan as under active edit; remote updates for it are held
    /// until the edit commits or is cancelled.
    BeginEdit { id: Uuid },

    /// Commit an edit with the given field changes.
    Edit { id: Uuid, fields: EditRequest },

    /// Abandon the active edit, releasing any held remote update.
    CancelEdit,

    /// Remove a plan.
    Delete { id: Uuid },

    /// Replace the manual ordering with the given id sequence, which must be
    /// a permutation of the current collection.
    Reorder { sequence: Vec<Uuid> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_tagged_serialization() {
        let intent = PlanIntent::Delete { id: Uuid::nil() };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "delete");
    }

    #[test]
    fn test_edit_request_roundtrip() {
        let fields = EditRequest {
            title: Some("new title".to_string()),
            description: None,
            progress: Some(80),
        };
        let intent = PlanIntent::Edit {
            id: Uuid::nil(),
            fields: fields.clone(),
        };
        let json = serde_json::to_string(&intent).unwrap();
        let back: PlanIntent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, intent);
    }
}
