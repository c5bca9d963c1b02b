//! Recurring charges and the date math that drives them.
//!
//! Only the "next occurrence" computation lives here. Deciding *when* to run
//! it (timers, push, app foreground) is the host's problem.
use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::expenses::SplitRule;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// When a recurring charge fires.
///
/// `interval` is "every N units" and must be >= 1; the store rejects 0.
/// `end_date` and `count` both bound the series: whichever is hit first
/// deactivates the charge during processing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: RecurrenceFrequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub count: Option<u32>,
}

fn default_interval() -> u32 {
    1
}

/// An expense template that fires on a schedule.
///
/// Mirrors [`Expense`]'s amount/split fields. `occurrences` counts the
/// instances spawned so far, so `rule.count` can be enforced.
///
/// [`Expense`]: crate::Expense
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecurringExpense {
    pub id: Uuid,
    pub group_id: Uuid,
    pub description: String,
    pub amount: f64,
    pub paid_by: Uuid,
    pub split: SplitRule,
    pub rule: RecurrenceRule,
    pub next_occurrence_at: DateTime<Utc>,
    pub active: bool,
    #[serde(default)]
    pub occurrences: u32,
    pub created_at: DateTime<Utc>,
}

/// Computes the first occurrence strictly after `from`.
///
/// If the rule has not started yet the answer is simply `start_date`.
/// Otherwise occurrences are stepped forward from `start_date` in whole
/// `interval` units of the frequency.
///
/// Month and year steps are always taken from `start_date`, never from the
/// previous occurrence, and use calendar arithmetic that clamps day-of-month
/// overflow to the last day of the target month: a rule starting Jan 31 fires
/// Feb 28 (Feb 29 in leap years) and then Mar 31 again. Stepping from the
/// previous occurrence instead would stick to the 28th forever.
pub fn next_occurrence(rule: &RecurrenceRule, from: DateTime<Utc>) -> DateTime<Utc> {
    if rule.start_date > from {
        return rule.start_date;
    }

    let interval = rule.interval.max(1);
    let mut step = 1u32;
    loop {
        let candidate = occurrence(rule.start_date, rule.frequency, interval, step);
        if candidate > from {
            return candidate;
        }
        step += 1;
    }
}

/// The `step`-th occurrence after `start` (step >= 1).
///
/// Saturates to the far future on overflow so callers terminate instead of
/// panicking.
fn occurrence(
    start: DateTime<Utc>,
    frequency: RecurrenceFrequency,
    interval: u32,
    step: u32,
) -> DateTime<Utc> {
    let units = interval.checked_mul(step);
    match frequency {
        RecurrenceFrequency::Daily => units
            .and_then(|n| start.checked_add_signed(TimeDelta::days(i64::from(n)))),
        RecurrenceFrequency::Weekly => units
            .and_then(|n| start.checked_add_signed(TimeDelta::days(7 * i64::from(n)))),
        RecurrenceFrequency::Monthly => units
            .and_then(|n| start.checked_add_months(Months::new(n))),
        RecurrenceFrequency::Yearly => units
            .and_then(|n| n.checked_mul(12))
            .and_then(|n| start.checked_add_months(Months::new(n))),
    }
    .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
