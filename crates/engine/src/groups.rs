//! A group fixes the participant set for its expenses and settlements.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shared-expense group.
///
/// `member_ids` is the fixed participant set: every expense and settlement of
/// the group must reference members from this list. The order is the display
/// order chosen at creation and is also the iteration order the ledger uses,
/// keeping derived results reproducible.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub member_ids: Vec<Uuid>,
    /// Optional ISO 4217 code overriding the app default. Formatting is the
    /// host's concern; the engine treats it as opaque.
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(
        name: impl Into<String>,
        member_ids: Vec<Uuid>,
        currency: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            member_ids,
            currency,
            created_at,
        }
    }

    /// Returns `true` if the member belongs to this group.
    #[must_use]
    pub fn contains(&self, member_id: Uuid) -> bool {
        self.member_ids.contains(&member_id)
    }
}
