//! Expenses and their split rules.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an expense is divided among the group members.
///
/// The `Amount` and `Percent` maps hold the *raw* values the user entered.
/// They are never taken literally: the share allocator rescales them so the
/// computed shares always sum to the expense amount (amounts are normalized
/// to the total, percentages to 100%). Entering 50/50/50 percent therefore
/// gives each member a third, not half.
///
/// Raw values are deliberately unchecked here. Negative numbers and keys
/// outside the group are accepted and resolved by the allocator; stricter
/// membership validation happens at the store boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "shares", rename_all = "snake_case")]
pub enum SplitRule {
    Equal,
    Amount(HashMap<Uuid, f64>),
    Percent(HashMap<Uuid, f64>),
}

impl SplitRule {
    /// The raw share map, if this rule carries one.
    #[must_use]
    pub fn shares(&self) -> Option<&HashMap<Uuid, f64>> {
        match self {
            Self::Equal => None,
            Self::Amount(shares) | Self::Percent(shares) => Some(shares),
        }
    }
}

impl Default for SplitRule {
    fn default() -> Self {
        Self::Equal
    }
}

/// A short discussion entry attached to an expense.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub member_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A shared expense.
///
/// Edits replace the record wholesale; nothing is patched in place outside
/// the store transition that owns it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub description: String,
    /// Currency units as a floating decimal, positive.
    pub amount: f64,
    pub paid_by: Uuid,
    pub split: SplitRule,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        group_id: Uuid,
        description: impl Into<String>,
        amount: f64,
        paid_by: Uuid,
        split: SplitRule,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            description: description.into(),
            amount,
            paid_by,
            split,
            comments: Vec::new(),
            created_at,
        }
    }
}
