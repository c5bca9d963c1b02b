//! Plain serde views of derived ledger results, shared by the host surfaces.
//!
//! Amounts are raw numbers; attaching a currency symbol or locale is the
//! consumer's job.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod balance {
    use super::*;

    /// One member's net position in a group.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub member_id: Uuid,
        pub name: String,
        /// Positive = owed money, negative = owes money.
        pub amount: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupBalances {
        pub group_id: Uuid,
        /// ISO 4217 code the amounts are denominated in.
        pub currency: String,
        pub balances: Vec<BalanceView>,
    }
}

pub mod settle {
    use super::*;

    /// A suggested payment clearing part of a group's debt.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SuggestionView {
        pub from_member_id: Uuid,
        pub from_name: String,
        pub to_member_id: Uuid,
        pub to_name: String,
        pub amount: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettleUp {
        pub group_id: Uuid,
        pub suggestions: Vec<SuggestionView>,
    }
}

pub mod totals {
    use super::*;

    /// "You are owed" / "you owe" scalars, for one group or across all.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TotalsView {
        pub member_id: Uuid,
        pub owed: f64,
        pub owes: f64,
    }
}

pub mod activity {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ActivityView {
        pub kind: String,
        pub message: String,
        pub created_at: DateTime<Utc>,
    }
}
