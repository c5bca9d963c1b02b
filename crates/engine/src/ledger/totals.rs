//! The totals projector: "you owe" / "you are owed" scalars.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::State;

use super::compute_shares;

/// Aggregate owed/owing position of one member.
///
/// Within a single group exactly one of the two is nonzero (or both are zero
/// when settled). Across groups both can be nonzero at once: the cross-group
/// projection reports gross exposure, not a net.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub owed: f64,
    pub owes: f64,
}

/// Projects one member's position out of a group balance map.
pub fn project_group_totals(balances: &HashMap<Uuid, f64>, member_id: Uuid) -> Totals {
    let net = balances.get(&member_id).copied().unwrap_or(0.0);
    Totals {
        owed: net.max(0.0),
        owes: (-net).max(0.0),
    }
}

/// Projects one member's position across every group.
///
/// Deliberately NOT the sum of per-group nets: netting across groups would
/// hide gross exposure. Instead, for every expense the member paid, the other
/// participants' shares add to `owed`; for every expense someone else paid in
/// a group the member belongs to, the member's own share adds to `owes`.
/// Every settlement anywhere then pays the corresponding running total down,
/// floored at zero.
///
/// Records are visited in (created_at, id) order so the floating-point fold
/// is reproducible across runs.
pub fn project_user_totals(state: &State, member_id: Uuid) -> Totals {
    let mut owed = 0.0f64;
    let mut owes = 0.0f64;

    let mut expenses: Vec<_> = state.expenses.values().collect();
    expenses.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    for expense in expenses {
        let Some(group) = state.groups.get(&expense.group_id) else {
            continue;
        };
        let shares = compute_shares(expense, &group.member_ids);
        if expense.paid_by == member_id {
            owed += group
                .member_ids
                .iter()
                .filter(|id| **id != member_id)
                .filter_map(|id| shares.get(id))
                .sum::<f64>();
        } else if group.contains(member_id) {
            owes += shares.get(&member_id).copied().unwrap_or(0.0);
        }
    }

    let mut settlements: Vec<_> = state.settlements.values().collect();
    settlements.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    for settlement in settlements {
        if settlement.from_member_id == member_id {
            owes = (owes - settlement.amount).max(0.0);
        }
        if settlement.to_member_id == member_id {
            owed = (owed - settlement.amount).max(0.0);
        }
    }

    Totals { owed, owes }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::{
        expenses::{Expense, SplitRule},
        groups::Group,
        settlements::Settlement,
        store::State,
    };

    use super::*;

    #[test]
    fn group_totals_split_the_net_by_sign() {
        let member = Uuid::new_v4();
        let balances = HashMap::from([(member, -12.5)]);
        let totals = project_group_totals(&balances, member);
        assert_eq!(totals.owes, 12.5);
        assert_eq!(totals.owed, 0.0);

        let balances = HashMap::from([(member, 7.0)]);
        let totals = project_group_totals(&balances, member);
        assert_eq!(totals.owed, 7.0);
        assert_eq!(totals.owes, 0.0);
    }

    #[test]
    fn group_totals_are_idempotent() {
        let member = Uuid::new_v4();
        let balances = HashMap::from([(member, 3.25), (Uuid::new_v4(), -3.25)]);
        assert_eq!(
            project_group_totals(&balances, member),
            project_group_totals(&balances, member)
        );
    }

    fn two_group_state() -> (State, Uuid, Uuid, Uuid) {
        let mut state = State::new("You");
        let me = state.current_member_id;
        let other = Uuid::new_v4();
        let now = Utc::now();

        let group_a = Group::new("A", vec![me, other], None, now);
        let group_b = Group::new("B", vec![me, other], None, now);
        let (a, b) = (group_a.id, group_b.id);
        state.groups.insert(a, group_a);
        state.groups.insert(b, group_b);
        (state, a, b, other)
    }

    // I paid 60 in group A (other owes me 30), the other member paid 40 in
    // group B (I owe 20). Gross exposure keeps both sides instead of netting
    // them to owed 10.
    #[test]
    fn cross_group_totals_keep_gross_exposure() {
        let (mut state, a, b, other) = two_group_state();
        let me = state.current_member_id;
        let e1 = Expense::new(a, "Dinner", 60.0, me, SplitRule::Equal, Utc::now());
        let e2 = Expense::new(b, "Taxi", 40.0, other, SplitRule::Equal, Utc::now());
        state.expenses.insert(e1.id, e1);
        state.expenses.insert(e2.id, e2);

        let totals = project_user_totals(&state, me);
        assert_eq!(totals.owed, 30.0);
        assert_eq!(totals.owes, 20.0);
    }

    #[test]
    fn settlements_pay_down_the_running_totals() {
        let (mut state, a, b, other) = two_group_state();
        let me = state.current_member_id;
        let e1 = Expense::new(a, "Dinner", 60.0, me, SplitRule::Equal, Utc::now());
        let e2 = Expense::new(b, "Taxi", 40.0, other, SplitRule::Equal, Utc::now());
        state.expenses.insert(e1.id, e1);
        state.expenses.insert(e2.id, e2);

        // The other member pays me 10; I pay them 25, more than I owe.
        let s1 = Settlement::new(a, other, me, 10.0, None, Utc::now());
        let s2 = Settlement::new(b, me, other, 25.0, None, Utc::now());
        state.settlements.insert(s1.id, s1);
        state.settlements.insert(s2.id, s2);

        let totals = project_user_totals(&state, me);
        assert_eq!(totals.owed, 20.0);
        // Floored at zero, never negative.
        assert_eq!(totals.owes, 0.0);
    }

    #[test]
    fn nonmember_has_empty_totals() {
        let (state, _, _, _) = two_group_state();
        let totals = project_user_totals(&state, Uuid::new_v4());
        assert_eq!(totals, Totals::default());
    }
}
