//! The balance aggregator: folds expenses and settlements into net positions.
use std::collections::HashMap;

use uuid::Uuid;

use crate::{expenses::Expense, groups::Group, settlements::Settlement};

use super::compute_shares;

/// Folds a group's expenses and settlements into a net balance per member.
///
/// Positive means the member is owed money, negative means they owe. The sum
/// over all members is zero within floating-point tolerance: each expense's
/// shares sum to its amount by construction and each settlement only moves
/// value between two members.
///
/// Records belonging to other groups are filtered out, so the full snapshot
/// collections can be passed directly. A record whose payer or parties are
/// not in `group.member_ids` is skipped whole; crediting or debiting only one
/// side of it would break conservation. The store boundary rejects such
/// records, this is the fallback for hand-edited snapshots.
///
/// The fold visits members in `group.member_ids` order so results are
/// reproducible regardless of map iteration order.
pub fn compute_group_balances<'a, E, S>(
    group: &Group,
    expenses: E,
    settlements: S,
) -> HashMap<Uuid, f64>
where
    E: IntoIterator<Item = &'a Expense>,
    S: IntoIterator<Item = &'a Settlement>,
{
    let mut balances: HashMap<Uuid, f64> =
        group.member_ids.iter().map(|id| (*id, 0.0)).collect();

    for expense in expenses
        .into_iter()
        .filter(|e| e.group_id == group.id)
    {
        if !balances.contains_key(&expense.paid_by) {
            continue;
        }
        let shares = compute_shares(expense, &group.member_ids);
        for member in &group.member_ids {
            if let (Some(balance), Some(share)) = (balances.get_mut(member), shares.get(member)) {
                *balance -= share;
            }
        }
        if let Some(balance) = balances.get_mut(&expense.paid_by) {
            *balance += expense.amount;
        }
    }

    for settlement in settlements
        .into_iter()
        .filter(|s| s.group_id == group.id)
    {
        if !balances.contains_key(&settlement.from_member_id)
            || !balances.contains_key(&settlement.to_member_id)
        {
            continue;
        }
        if let Some(balance) = balances.get_mut(&settlement.from_member_id) {
            *balance += settlement.amount;
        }
        if let Some(balance) = balances.get_mut(&settlement.to_member_id) {
            *balance -= settlement.amount;
        }
    }

    balances
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::expenses::SplitRule;

    use super::*;

    fn group_of(n: usize) -> Group {
        let members = (0..n).map(|_| Uuid::new_v4()).collect();
        Group::new("Trip", members, None, Utc::now())
    }

    #[test]
    fn equal_expense_credits_payer_and_debits_everyone() {
        let group = group_of(3);
        let payer = group.member_ids[0];
        let expense = Expense::new(group.id, "Dinner", 60.0, payer, SplitRule::Equal, Utc::now());

        let balances = compute_group_balances(&group, [&expense], []);
        assert_eq!(balances[&payer], 40.0);
        assert_eq!(balances[&group.member_ids[1]], -20.0);
        assert_eq!(balances[&group.member_ids[2]], -20.0);
    }

    #[test]
    fn settlement_moves_value_between_the_two_parties() {
        let group = group_of(2);
        let (a, b) = (group.member_ids[0], group.member_ids[1]);
        let expense = Expense::new(group.id, "Taxi", 30.0, a, SplitRule::Equal, Utc::now());
        let settlement = Settlement::new(group.id, b, a, 15.0, None, Utc::now());

        let balances = compute_group_balances(&group, [&expense], [&settlement]);
        assert_eq!(balances[&a], 0.0);
        assert_eq!(balances[&b], 0.0);
    }

    #[test]
    fn records_from_other_groups_are_filtered_out() {
        let group = group_of(2);
        let other = group_of(2);
        let payer = other.member_ids[0];
        let expense = Expense::new(other.id, "Hotel", 100.0, payer, SplitRule::Equal, Utc::now());

        let balances = compute_group_balances(&group, [&expense], []);
        assert!(balances.values().all(|b| *b == 0.0));
    }

    #[test]
    fn out_of_group_payer_skips_the_whole_expense() {
        let group = group_of(2);
        let stranger = Uuid::new_v4();
        let expense = Expense::new(group.id, "Bar", 50.0, stranger, SplitRule::Equal, Utc::now());

        let balances = compute_group_balances(&group, [&expense], []);
        assert!(balances.values().all(|b| *b == 0.0));
        let total: f64 = balances.values().sum();
        assert!(total.abs() < 1e-6);
    }

    #[test]
    fn out_of_group_settlement_party_is_skipped() {
        let group = group_of(2);
        let a = group.member_ids[0];
        let settlement = Settlement::new(group.id, a, Uuid::new_v4(), 10.0, None, Utc::now());

        let balances = compute_group_balances(&group, [], [&settlement]);
        assert!(balances.values().all(|b| *b == 0.0));
    }

    #[test]
    fn expense_order_does_not_change_the_result() {
        let group = group_of(3);
        let members = &group.member_ids;
        let expenses = vec![
            Expense::new(group.id, "A", 60.0, members[0], SplitRule::Equal, Utc::now()),
            Expense::new(
                group.id,
                "B",
                45.0,
                members[1],
                SplitRule::Amount(members.iter().map(|id| (*id, 10.0)).collect()),
                Utc::now(),
            ),
            Expense::new(group.id, "C", 12.5, members[2], SplitRule::Equal, Utc::now()),
        ];
        let forward = compute_group_balances(&group, &expenses, []);
        let reversed: Vec<&Expense> = expenses.iter().rev().collect();
        let backward = compute_group_balances(&group, reversed, []);

        for member in members {
            assert!((forward[member] - backward[member]).abs() < 1e-9);
        }
    }

    #[test]
    fn mixed_split_types_conserve_money() {
        let group = group_of(4);
        let members = &group.member_ids;
        let expenses = vec![
            Expense::new(group.id, "Rent", 1000.0, members[0], SplitRule::Equal, Utc::now()),
            Expense::new(
                group.id,
                "Food",
                83.4,
                members[1],
                SplitRule::Percent(HashMap::from([(members[0], 50.0), (members[1], 50.0), (members[2], 50.0)])),
                Utc::now(),
            ),
            Expense::new(
                group.id,
                "Gas",
                61.27,
                members[2],
                SplitRule::Amount(HashMap::from([(members[2], 20.0), (members[3], 25.0)])),
                Utc::now(),
            ),
        ];
        let settlements = vec![
            Settlement::new(group.id, members[3], members[0], 120.0, None, Utc::now()),
            Settlement::new(group.id, members[1], members[0], 33.33, None, Utc::now()),
        ];

        let balances = compute_group_balances(&group, &expenses, &settlements);
        let total: f64 = balances.values().sum();
        assert!(total.abs() < 1e-6, "balances sum to {total}");
    }
}
