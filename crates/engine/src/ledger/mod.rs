//! The pure derive path: shares, balances, totals and settle-up suggestions.
//!
//! Everything in this module is a stateless transformation over borrowed
//! snapshots. No I/O, no mutation of inputs, no errors: malformed records are
//! resolved by fallback or skipped, never rejected here (the store boundary
//! rejects them before they ever reach a snapshot).

mod balances;
mod settle_up;
mod shares;
mod totals;

pub use balances::compute_group_balances;
pub use settle_up::{SETTLE_EPSILON, SettlementSuggestion, suggest_settlements};
pub use shares::compute_shares;
pub use totals::{Totals, project_group_totals, project_user_totals};
