//! The share allocator: divides an expense's amount among the group members.
use std::collections::HashMap;

use uuid::Uuid;

use crate::expenses::{Expense, SplitRule};

/// Computes each member's monetary share of an expense.
///
/// - `Equal` gives every member `amount / count`.
/// - `Amount` and `Percent` rescale the raw share map so the result sums to
///   the expense amount no matter what the raw values summed to. Members
///   missing from the map contribute 0 and receive 0; keys outside
///   `member_ids` are ignored entirely.
/// - If the raw values sum to zero or less (nothing entered, or negatives
///   cancelling everything out) the split falls back to equal.
///
/// Negative raw values are kept as-is: they count toward the sum and can
/// produce negative allocations. The allocator does not judge them.
///
/// An empty `member_ids` returns an empty map; no division by zero can leak
/// a NaN or infinity into the balances.
pub fn compute_shares(expense: &Expense, member_ids: &[Uuid]) -> HashMap<Uuid, f64> {
    if member_ids.is_empty() {
        return HashMap::new();
    }

    match &expense.split {
        SplitRule::Equal => equal_split(expense.amount, member_ids),
        SplitRule::Amount(raw) | SplitRule::Percent(raw) => {
            scaled_split(expense.amount, member_ids, raw)
        }
    }
}

fn equal_split(amount: f64, member_ids: &[Uuid]) -> HashMap<Uuid, f64> {
    let share = amount / member_ids.len() as f64;
    member_ids.iter().map(|id| (*id, share)).collect()
}

/// Rescales raw shares by `amount / sum`.
///
/// The same formula covers both split kinds: for amounts it normalizes to
/// the total, for percentages to 100%.
fn scaled_split(amount: f64, member_ids: &[Uuid], raw: &HashMap<Uuid, f64>) -> HashMap<Uuid, f64> {
    let sum: f64 = member_ids
        .iter()
        .map(|id| raw.get(id).copied().unwrap_or(0.0))
        .sum();
    if sum <= 0.0 {
        return equal_split(amount, member_ids);
    }

    member_ids
        .iter()
        .map(|id| {
            let value = raw.get(id).copied().unwrap_or(0.0);
            (*id, amount * (value / sum))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn members(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn expense(amount: f64, split: SplitRule) -> Expense {
        Expense::new(
            Uuid::new_v4(),
            "Dinner",
            amount,
            Uuid::new_v4(),
            split,
            Utc::now(),
        )
    }

    #[test]
    fn equal_split_sums_to_amount() {
        let ids = members(3);
        let shares = compute_shares(&expense(60.0, SplitRule::Equal), &ids);
        for id in &ids {
            assert_eq!(shares[id], 20.0);
        }
        assert_eq!(shares.values().sum::<f64>(), 60.0);
    }

    #[test]
    fn empty_member_set_yields_empty_map() {
        let shares = compute_shares(&expense(60.0, SplitRule::Equal), &[]);
        assert!(shares.is_empty());
    }

    #[test]
    fn amount_split_normalizes_to_total() {
        let ids = members(3);
        let raw = ids.iter().map(|id| (*id, 10.0)).collect();
        let shares = compute_shares(&expense(45.0, SplitRule::Amount(raw)), &ids);
        for id in &ids {
            assert_eq!(shares[id], 15.0);
        }
    }

    #[test]
    fn percent_split_normalizes_to_hundred() {
        let ids = members(3);
        let raw = ids.iter().map(|id| (*id, 50.0)).collect();
        let shares = compute_shares(&expense(90.0, SplitRule::Percent(raw)), &ids);
        for id in &ids {
            assert_eq!(shares[id], 30.0);
        }
    }

    #[test]
    fn missing_members_get_zero() {
        let ids = members(3);
        let raw = HashMap::from([(ids[0], 30.0), (ids[1], 10.0)]);
        let shares = compute_shares(&expense(80.0, SplitRule::Amount(raw)), &ids);
        assert_eq!(shares[&ids[0]], 60.0);
        assert_eq!(shares[&ids[1]], 20.0);
        assert_eq!(shares[&ids[2]], 0.0);
    }

    #[test]
    fn keys_outside_the_group_are_ignored() {
        let ids = members(2);
        let raw = HashMap::from([(ids[0], 10.0), (ids[1], 10.0), (Uuid::new_v4(), 100.0)]);
        let shares = compute_shares(&expense(20.0, SplitRule::Amount(raw)), &ids);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[&ids[0]], 10.0);
        assert_eq!(shares[&ids[1]], 10.0);
    }

    #[test]
    fn nonpositive_sum_falls_back_to_equal() {
        let ids = members(2);
        let zeroes = ids.iter().map(|id| (*id, 0.0)).collect();
        let shares = compute_shares(&expense(10.0, SplitRule::Percent(zeroes)), &ids);
        assert_eq!(shares[&ids[0]], 5.0);
        assert_eq!(shares[&ids[1]], 5.0);

        let negative = ids.iter().map(|id| (*id, -4.0)).collect();
        let shares = compute_shares(&expense(10.0, SplitRule::Amount(negative)), &ids);
        assert_eq!(shares[&ids[0]], 5.0);
    }

    // Legacy-permissive behavior: a negative raw share is included in the sum
    // and produces a negative allocation when the sum stays positive.
    #[test]
    fn negative_raw_shares_are_kept() {
        let ids = members(2);
        let raw = HashMap::from([(ids[0], 30.0), (ids[1], -10.0)]);
        let shares = compute_shares(&expense(40.0, SplitRule::Amount(raw)), &ids);
        assert_eq!(shares[&ids[0]], 60.0);
        assert_eq!(shares[&ids[1]], -20.0);
        assert!((shares.values().sum::<f64>() - 40.0).abs() < 1e-9);
    }
}
