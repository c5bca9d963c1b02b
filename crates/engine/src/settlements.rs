//! Settlements record real-world payments between two members.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A real payment from one member to another.
///
/// It is not an expense: it only moves value between the two parties, paying
/// down the payer's debt and reducing what the receiver is owed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settlement {
    pub id: Uuid,
    pub group_id: Uuid,
    pub from_member_id: Uuid,
    pub to_member_id: Uuid,
    /// Currency units, positive.
    pub amount: f64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Settlement {
    pub fn new(
        group_id: Uuid,
        from_member_id: Uuid,
        to_member_id: Uuid,
        amount: f64,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            from_member_id,
            to_member_id,
            amount,
            note,
            created_at,
        }
    }
}
