//! The activity feed: a human-readable trail of every mutating action,
//! newest first.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    MemberAdded,
    GroupCreated,
    GroupRenamed,
    ExpenseAdded,
    ExpenseEdited,
    ExpenseDeleted,
    RecurringAdded,
    RecurringEdited,
    RecurringDeleted,
    SettlementRecorded,
    SettlementDeleted,
    CommentAdded,
}

/// One feed entry. The message is already formatted for display; the kind is
/// kept so hosts can filter or pick icons.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityItem {
    pub fn new(kind: ActivityKind, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at,
        }
    }
}
