//! The Evenly ledger engine.
//!
//! Turns groups, expenses, split rules and settlements into per-member
//! balances, owed/owing totals and minimal settle-up suggestions. The
//! [`ledger`] module is the pure computational core; [`State`] and its
//! [`Action`]s are the reducer-style state layer the host drives. The crate
//! does no I/O: hosts persist [`State`] as an opaque JSON blob through serde
//! and pass the current time into every transition.
pub use activity::{ActivityItem, ActivityKind};
pub use error::EngineError;
pub use expenses::{Comment, Expense, SplitRule};
pub use groups::Group;
pub use ledger::{
    SETTLE_EPSILON, SettlementSuggestion, Totals, compute_group_balances, compute_shares,
    project_group_totals, project_user_totals, suggest_settlements,
};
pub use members::Member;
pub use recurring::{
    RecurrenceFrequency, RecurrenceRule, RecurringExpense, next_occurrence,
};
pub use settlements::Settlement;
pub use store::{
    Action, AddExpense, AddRecurring, AddSettlement, EditExpense, EditRecurring, Settings, State,
};

mod activity;
mod error;
mod expenses;
mod groups;
pub mod ledger;
mod members;
mod recurring;
mod settlements;
mod store;

type ResultEngine<T> = Result<T, EngineError>;
