//! The settlement optimizer: greedy debt netting.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Balances within half a cent of zero are considered settled. Also the floor
/// for suggested amounts.
pub const SETTLE_EPSILON: f64 = 0.005;

/// A suggested payment that helps clear the group's balances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlementSuggestion {
    pub from_member_id: Uuid,
    pub to_member_id: Uuid,
    pub amount: f64,
}

/// Suggests payments (debtor → creditor) that zero out all balances.
///
/// Greedy matching of the largest debtor against the largest creditor. This
/// keeps the transaction count low in practice but is not an exact
/// minimum-transaction solver: multi-way ties can admit shorter solutions.
///
/// Ties are broken by member id so the output never depends on map iteration
/// order. Applying every suggestion to the input balances leaves every member
/// within [`SETTLE_EPSILON`] of zero.
pub fn suggest_settlements(balances: &HashMap<Uuid, f64>) -> Vec<SettlementSuggestion> {
    let mut debtors: Vec<(Uuid, f64)> = balances
        .iter()
        .filter(|(_, balance)| **balance < -SETTLE_EPSILON)
        .map(|(id, balance)| (*id, -balance))
        .collect();
    let mut creditors: Vec<(Uuid, f64)> = balances
        .iter()
        .filter(|(_, balance)| **balance > SETTLE_EPSILON)
        .map(|(id, balance)| (*id, *balance))
        .collect();

    debtors.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    creditors.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut suggestions = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < debtors.len() && j < creditors.len() {
        let payment = debtors[i].1.min(creditors[j].1);
        if payment > SETTLE_EPSILON {
            suggestions.push(SettlementSuggestion {
                from_member_id: debtors[i].0,
                to_member_id: creditors[j].0,
                amount: payment,
            });
        }
        debtors[i].1 -= payment;
        creditors[j].1 -= payment;
        if debtors[i].1 <= SETTLE_EPSILON {
            i += 1;
        }
        if creditors[j].1 <= SETTLE_EPSILON {
            j += 1;
        }
    }

    suggestions
}
