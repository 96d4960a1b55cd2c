use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Addition,
    AdditionFailed,
    Modification,
    ModificationFailed,
    Deletion,
    DeletionFailed,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Addition => write!(f, "ADDITION"),
            EventType::AdditionFailed => write!(f, "ADDITION_FAILED"),
            EventType::Modification => write!(f, "MODIFICATION"),
            EventType::ModificationFailed => write!(f, "MODIFICATION_FAILED"),
            EventType::Deletion => write!(f, "DELETION"),
            EventType::DeletionFailed => write!(f, "DELETION_FAILED"),
        }
    }
}

/// Outcome record for one binding. Events are only ever appended.
/// Stored at `/registry/events/<namespace>/<timestamp>-<id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub kind: EventType,
    pub message: String,
    pub namespace: String,
    pub binding_name: String,
    pub binding_id: String,
    pub timestamp: DateTime<Utc>,
}
