//! The application state and its transition function.
//!
//! The store is an explicit reducer: the host owns a [`State`], feeds it
//! [`Action`]s together with the current time, and reads derived values
//! through the selectors. The pure ledger functions never hold state.
//!
//! Transitions validate at the boundary: actions referencing unknown ids or
//! members outside the target group are rejected instead of silently
//! ignored, so snapshots stay internally consistent and the ledger's
//! conservation invariant cannot be broken from here.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ResultEngine,
    activity::{ActivityItem, ActivityKind},
    error::EngineError,
    expenses::{Comment, Expense, SplitRule},
    groups::Group,
    ledger,
    ledger::{SettlementSuggestion, Totals},
    members::Member,
    recurring::{RecurrenceRule, RecurringExpense, next_occurrence},
    settlements::Settlement,
};

/// App-level preferences. Codes are opaque to the engine; formatting with
/// them is the host's concern.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// ISO 4217 code, e.g. "USD".
    pub currency: String,
    /// BCP 47 tag; `None` follows the device.
    pub locale: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            locale: None,
        }
    }
}

/// The full application snapshot.
///
/// The host persists this as one opaque JSON blob and hands the engine
/// read-only borrows on the derive paths.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct State {
    pub current_member_id: Uuid,
    pub members: HashMap<Uuid, Member>,
    pub groups: HashMap<Uuid, Group>,
    /// Display ordering for group lists, newest first.
    pub group_order: Vec<Uuid>,
    pub expenses: HashMap<Uuid, Expense>,
    pub recurring: HashMap<Uuid, RecurringExpense>,
    pub settlements: HashMap<Uuid, Settlement>,
    /// Newest first.
    pub activity: Vec<ActivityItem>,
    pub settings: Settings,
}

/// Create an expense.
#[derive(Clone, Debug)]
pub struct AddExpense {
    pub group_id: Uuid,
    pub description: String,
    pub amount: f64,
    /// Defaults to the current member.
    pub paid_by: Option<Uuid>,
    pub split: SplitRule,
}

/// Edit an expense. `None` fields keep their previous value.
#[derive(Clone, Debug, Default)]
pub struct EditExpense {
    pub id: Uuid,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub paid_by: Option<Uuid>,
    pub split: Option<SplitRule>,
}

/// Create a recurring charge.
#[derive(Clone, Debug)]
pub struct AddRecurring {
    pub group_id: Uuid,
    pub description: String,
    pub amount: f64,
    pub paid_by: Option<Uuid>,
    pub split: SplitRule,
    pub rule: RecurrenceRule,
}

/// Edit a recurring charge. `None` fields keep their previous value.
#[derive(Clone, Debug, Default)]
pub struct EditRecurring {
    pub id: Uuid,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub paid_by: Option<Uuid>,
    pub split: Option<SplitRule>,
    pub rule: Option<RecurrenceRule>,
    pub active: Option<bool>,
}

/// Record a real payment between two group members.
#[derive(Clone, Debug)]
pub struct AddSettlement {
    pub group_id: Uuid,
    pub from_member_id: Uuid,
    pub to_member_id: Uuid,
    pub amount: f64,
    pub note: Option<String>,
}

/// Every state transition the store accepts.
#[derive(Clone, Debug)]
pub enum Action {
    AddMember { name: String },
    AddGroup { name: String, member_ids: Vec<Uuid>, currency: Option<String> },
    RenameGroup { id: Uuid, name: String },
    SetGroupCurrency { id: Uuid, currency: Option<String> },
    AddExpense(AddExpense),
    EditExpense(EditExpense),
    DeleteExpense { id: Uuid },
    AddRecurring(AddRecurring),
    EditRecurring(EditRecurring),
    DeleteRecurring { id: Uuid },
    ToggleRecurringActive { id: Uuid, active: bool },
    /// Spawn expenses for every active recurring charge that came due.
    ProcessRecurring,
    AddSettlement(AddSettlement),
    DeleteSettlement { id: Uuid },
    AddComment { expense_id: Uuid, text: String },
    SetCurrency { currency: String },
    SetLocale { locale: Option<String> },
}

impl State {
    /// Fresh state owned by a single member (the device user).
    pub fn new(display_name: impl Into<String>) -> Self {
        let me = Member::new(display_name);
        let current_member_id = me.id;
        Self {
            current_member_id,
            members: HashMap::from([(me.id, me)]),
            groups: HashMap::new(),
            group_order: Vec::new(),
            expenses: HashMap::new(),
            recurring: HashMap::new(),
            settlements: HashMap::new(),
            activity: Vec::new(),
            settings: Settings::default(),
        }
    }

    /// Applies one action at time `now`.
    ///
    /// `now` is passed in so the transition stays deterministic; it stamps
    /// `created_at` fields, the activity feed and recurring processing.
    pub fn apply(&mut self, action: Action, now: DateTime<Utc>) -> ResultEngine<()> {
        match action {
            Action::AddMember { name } => self.add_member(name, now),
            Action::AddGroup { name, member_ids, currency } => {
                self.add_group(name, member_ids, currency, now)
            }
            Action::RenameGroup { id, name } => self.rename_group(id, name, now),
            Action::SetGroupCurrency { id, currency } => {
                let group = self
                    .groups
                    .get_mut(&id)
                    .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;
                group.currency = currency;
                Ok(())
            }
            Action::AddExpense(payload) => self.add_expense(payload, now),
            Action::EditExpense(payload) => self.edit_expense(payload, now),
            Action::DeleteExpense { id } => self.delete_expense(id, now),
            Action::AddRecurring(payload) => self.add_recurring(payload, now),
            Action::EditRecurring(payload) => self.edit_recurring(payload, now),
            Action::DeleteRecurring { id } => self.delete_recurring(id, now),
            Action::ToggleRecurringActive { id, active } => {
                self.toggle_recurring(id, active, now)
            }
            Action::ProcessRecurring => {
                self.process_recurring(now);
                Ok(())
            }
            Action::AddSettlement(payload) => self.add_settlement(payload, now),
            Action::DeleteSettlement { id } => self.delete_settlement(id, now),
            Action::AddComment { expense_id, text } => self.add_comment(expense_id, text, now),
            Action::SetCurrency { currency } => {
                self.settings.currency = currency;
                Ok(())
            }
            Action::SetLocale { locale } => {
                self.settings.locale = locale;
                Ok(())
            }
        }
    }

    fn add_member(&mut self, name: String, now: DateTime<Utc>) -> ResultEngine<()> {
        let name = normalize_required_name(&name, "member")?;
        if self.members.values().any(|m| m.name == name) {
            return Err(EngineError::ExistingKey(name));
        }
        let member = Member::new(name.clone());
        self.members.insert(member.id, member);
        self.log(ActivityKind::MemberAdded, format!("Added member “{name}”"), now);
        Ok(())
    }

    fn add_group(
        &mut self,
        name: String,
        member_ids: Vec<Uuid>,
        currency: Option<String>,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(&name, "group")?;
        // No explicit members means everyone.
        let member_ids = if member_ids.is_empty() {
            let mut all: Vec<Uuid> = self.members.keys().copied().collect();
            all.sort();
            all
        } else {
            for id in &member_ids {
                if !self.members.contains_key(id) {
                    return Err(EngineError::UnknownMember(id.to_string()));
                }
            }
            member_ids
        };

        let group = Group::new(name.clone(), member_ids, currency, now);
        let id = group.id;
        self.groups.insert(id, group);
        self.group_order.insert(0, id);
        self.log(ActivityKind::GroupCreated, format!("Created group “{name}”"), now);
        Ok(())
    }

    fn rename_group(&mut self, id: Uuid, name: String, now: DateTime<Utc>) -> ResultEngine<()> {
        let name = normalize_required_name(&name, "group")?;
        let group = self
            .groups
            .get_mut(&id)
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;
        group.name = name.clone();
        self.log(ActivityKind::GroupRenamed, format!("Renamed group to “{name}”"), now);
        Ok(())
    }

    fn add_expense(&mut self, payload: AddExpense, now: DateTime<Utc>) -> ResultEngine<()> {
        let group = self
            .groups
            .get(&payload.group_id)
            .ok_or_else(|| EngineError::KeyNotFound(payload.group_id.to_string()))?;
        ensure_positive_amount(payload.amount)?;
        let paid_by = payload.paid_by.unwrap_or(self.current_member_id);
        ensure_group_member(group, paid_by)?;
        ensure_split_members(group, &payload.split)?;

        let group_name = group.name.clone();
        let expense = Expense::new(
            payload.group_id,
            payload.description,
            payload.amount,
            paid_by,
            payload.split,
            now,
        );
        let message = format!(
            "Added “{}” {:.2} in {}",
            expense.description, expense.amount, group_name
        );
        self.expenses.insert(expense.id, expense);
        self.log(ActivityKind::ExpenseAdded, message, now);
        Ok(())
    }

    fn edit_expense(&mut self, payload: EditExpense, now: DateTime<Utc>) -> ResultEngine<()> {
        let expense = self
            .expenses
            .get(&payload.id)
            .ok_or_else(|| EngineError::KeyNotFound(payload.id.to_string()))?;
        let group = self
            .groups
            .get(&expense.group_id)
            .ok_or_else(|| EngineError::KeyNotFound(expense.group_id.to_string()))?;

        if let Some(amount) = payload.amount {
            ensure_positive_amount(amount)?;
        }
        if let Some(paid_by) = payload.paid_by {
            ensure_group_member(group, paid_by)?;
        }
        if let Some(split) = &payload.split {
            ensure_split_members(group, split)?;
        }

        let group_name = group.name.clone();
        // Checks passed; now take the record apart and rebuild it.
        if let Some(expense) = self.expenses.get_mut(&payload.id) {
            if let Some(description) = payload.description {
                expense.description = description;
            }
            if let Some(amount) = payload.amount {
                expense.amount = amount;
            }
            if let Some(paid_by) = payload.paid_by {
                expense.paid_by = paid_by;
            }
            if let Some(split) = payload.split {
                expense.split = split;
            }
            let message = format!(
                "Edited “{}” {:.2} in {}",
                expense.description, expense.amount, group_name
            );
            self.log(ActivityKind::ExpenseEdited, message, now);
        }
        Ok(())
    }

    fn delete_expense(&mut self, id: Uuid, now: DateTime<Utc>) -> ResultEngine<()> {
        let expense = self
            .expenses
            .remove(&id)
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;
        let group_name = self
            .groups
            .get(&expense.group_id)
            .map_or("group", |g| g.name.as_str());
        let message = format!("Deleted “{}” from {}", expense.description, group_name);
        self.log(ActivityKind::ExpenseDeleted, message, now);
        Ok(())
    }

    fn add_recurring(&mut self, payload: AddRecurring, now: DateTime<Utc>) -> ResultEngine<()> {
        let group = self
            .groups
            .get(&payload.group_id)
            .ok_or_else(|| EngineError::KeyNotFound(payload.group_id.to_string()))?;
        ensure_positive_amount(payload.amount)?;
        let paid_by = payload.paid_by.unwrap_or(self.current_member_id);
        ensure_group_member(group, paid_by)?;
        ensure_split_members(group, &payload.split)?;
        validate_rule(&payload.rule)?;

        let charge = RecurringExpense {
            id: Uuid::new_v4(),
            group_id: payload.group_id,
            description: payload.description,
            amount: payload.amount,
            paid_by,
            split: payload.split,
            next_occurrence_at: next_occurrence(&payload.rule, now),
            rule: payload.rule,
            active: true,
            occurrences: 0,
            created_at: now,
        };
        let message = format!("Added recurring “{}”", charge.description);
        self.recurring.insert(charge.id, charge);
        self.log(ActivityKind::RecurringAdded, message, now);
        Ok(())
    }

    fn edit_recurring(&mut self, payload: EditRecurring, now: DateTime<Utc>) -> ResultEngine<()> {
        let charge = self
            .recurring
            .get(&payload.id)
            .ok_or_else(|| EngineError::KeyNotFound(payload.id.to_string()))?;
        let group = self
            .groups
            .get(&charge.group_id)
            .ok_or_else(|| EngineError::KeyNotFound(charge.group_id.to_string()))?;

        if let Some(amount) = payload.amount {
            ensure_positive_amount(amount)?;
        }
        if let Some(paid_by) = payload.paid_by {
            ensure_group_member(group, paid_by)?;
        }
        if let Some(split) = &payload.split {
            ensure_split_members(group, split)?;
        }
        if let Some(rule) = &payload.rule {
            validate_rule(rule)?;
        }

        if let Some(charge) = self.recurring.get_mut(&payload.id) {
            if let Some(description) = payload.description {
                charge.description = description;
            }
            if let Some(amount) = payload.amount {
                charge.amount = amount;
            }
            if let Some(paid_by) = payload.paid_by {
                charge.paid_by = paid_by;
            }
            if let Some(split) = payload.split {
                charge.split = split;
            }
            if let Some(rule) = payload.rule {
                charge.next_occurrence_at = next_occurrence(&rule, now);
                charge.rule = rule;
            }
            if let Some(active) = payload.active {
                charge.active = active;
            }
            let message = format!("Edited recurring “{}”", charge.description);
            self.log(ActivityKind::RecurringEdited, message, now);
        }
        Ok(())
    }

    fn delete_recurring(&mut self, id: Uuid, now: DateTime<Utc>) -> ResultEngine<()> {
        let charge = self
            .recurring
            .remove(&id)
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;
        let message = format!("Deleted recurring “{}”", charge.description);
        self.log(ActivityKind::RecurringDeleted, message, now);
        Ok(())
    }

    fn toggle_recurring(&mut self, id: Uuid, active: bool, now: DateTime<Utc>) -> ResultEngine<()> {
        let charge = self
            .recurring
            .get_mut(&id)
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;
        charge.active = active;
        let verb = if active { "Resumed" } else { "Paused" };
        let message = format!("{verb} recurring “{}”", charge.description);
        self.log(ActivityKind::RecurringEdited, message, now);
        Ok(())
    }

    /// Spawns an expense for every occurrence that came due, catching up on
    /// all of them when several were missed. A charge is deactivated once
    /// `rule.count` occurrences were spawned or the next occurrence would
    /// pass `rule.end_date`.
    fn process_recurring(&mut self, now: DateTime<Utc>) {
        let mut due: Vec<Uuid> = self
            .recurring
            .iter()
            .filter(|(_, charge)| charge.active && charge.next_occurrence_at <= now)
            .map(|(id, _)| *id)
            .collect();
        due.sort_by_key(|id| {
            self.recurring
                .get(id)
                .map(|charge| (charge.created_at, charge.id))
        });

        for id in due {
            let mut spawned = Vec::new();
            if let Some(charge) = self.recurring.get_mut(&id) {
                while charge.active && charge.next_occurrence_at <= now {
                    if let Some(end) = charge.rule.end_date
                        && charge.next_occurrence_at > end
                    {
                        charge.active = false;
                        break;
                    }

                    let expense = Expense::new(
                        charge.group_id,
                        charge.description.clone(),
                        charge.amount,
                        charge.paid_by,
                        charge.split.clone(),
                        charge.next_occurrence_at,
                    );
                    spawned.push(format!(
                        "Added “{}” {:.2} (recurring)",
                        expense.description, expense.amount
                    ));
                    self.expenses.insert(expense.id, expense);

                    charge.occurrences += 1;
                    if let Some(count) = charge.rule.count
                        && charge.occurrences >= count
                    {
                        charge.active = false;
                    }

                    let next = next_occurrence(&charge.rule, charge.next_occurrence_at);
                    if let Some(end) = charge.rule.end_date
                        && next > end
                    {
                        charge.active = false;
                    }
                    charge.next_occurrence_at = next;
                }
            }
            for message in spawned {
                self.log(ActivityKind::ExpenseAdded, message, now);
            }
        }
    }

    fn add_settlement(&mut self, payload: AddSettlement, now: DateTime<Utc>) -> ResultEngine<()> {
        let group = self
            .groups
            .get(&payload.group_id)
            .ok_or_else(|| EngineError::KeyNotFound(payload.group_id.to_string()))?;
        ensure_positive_amount(payload.amount)?;
        ensure_group_member(group, payload.from_member_id)?;
        ensure_group_member(group, payload.to_member_id)?;

        let settlement = Settlement::new(
            payload.group_id,
            payload.from_member_id,
            payload.to_member_id,
            payload.amount,
            payload.note,
            now,
        );
        let message = format!(
            "Recorded payment {} → {} {:.2}",
            self.member_name(settlement.from_member_id),
            self.member_name(settlement.to_member_id),
            settlement.amount
        );
        self.settlements.insert(settlement.id, settlement);
        self.log(ActivityKind::SettlementRecorded, message, now);
        Ok(())
    }

    fn delete_settlement(&mut self, id: Uuid, now: DateTime<Utc>) -> ResultEngine<()> {
        let settlement = self
            .settlements
            .remove(&id)
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;
        let message = format!(
            "Deleted payment {} → {}",
            self.member_name(settlement.from_member_id),
            self.member_name(settlement.to_member_id)
        );
        self.log(ActivityKind::SettlementDeleted, message, now);
        Ok(())
    }

    fn add_comment(&mut self, expense_id: Uuid, text: String, now: DateTime<Utc>) -> ResultEngine<()> {
        let member_id = self.current_member_id;
        let expense = self
            .expenses
            .get_mut(&expense_id)
            .ok_or_else(|| EngineError::KeyNotFound(expense_id.to_string()))?;
        expense.comments.push(Comment {
            id: Uuid::new_v4(),
            member_id,
            text,
            created_at: now,
        });
        let message = format!("Commented on “{}”", expense.description);
        self.log(ActivityKind::CommentAdded, message, now);
        Ok(())
    }

    // Selectors. All read-only; derived values are computed on demand.

    /// Groups in display order.
    pub fn groups_in_order(&self) -> impl Iterator<Item = &Group> {
        self.group_order.iter().filter_map(|id| self.groups.get(id))
    }

    /// A group's expenses, newest first.
    pub fn expenses_for_group(&self, group_id: Uuid) -> Vec<&Expense> {
        let mut expenses: Vec<&Expense> = self
            .expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .collect();
        expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        expenses
    }

    /// A group's settlements, newest first.
    pub fn settlements_for_group(&self, group_id: Uuid) -> Vec<&Settlement> {
        let mut settlements: Vec<&Settlement> = self
            .settlements
            .values()
            .filter(|s| s.group_id == group_id)
            .collect();
        settlements.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        settlements
    }

    /// Recurring charges, oldest first.
    pub fn recurring_in_order(&self) -> Vec<&RecurringExpense> {
        let mut charges: Vec<&RecurringExpense> = self.recurring.values().collect();
        charges.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        charges
    }

    /// Net balance per member of a group.
    pub fn group_balances(&self, group_id: Uuid) -> ResultEngine<HashMap<Uuid, f64>> {
        let group = self
            .groups
            .get(&group_id)
            .ok_or_else(|| EngineError::KeyNotFound(group_id.to_string()))?;
        Ok(ledger::compute_group_balances(
            group,
            self.expenses.values(),
            self.settlements.values(),
        ))
    }

    /// One member's owed/owes position within a group.
    pub fn group_totals(&self, group_id: Uuid, member_id: Uuid) -> ResultEngine<Totals> {
        let balances = self.group_balances(group_id)?;
        Ok(ledger::project_group_totals(&balances, member_id))
    }

    /// One member's gross owed/owes position across all groups.
    pub fn user_totals(&self, member_id: Uuid) -> Totals {
        ledger::project_user_totals(self, member_id)
    }

    /// Suggested payments that would settle a group.
    pub fn settle_up(&self, group_id: Uuid) -> ResultEngine<Vec<SettlementSuggestion>> {
        let balances = self.group_balances(group_id)?;
        Ok(ledger::suggest_settlements(&balances))
    }

    fn member_name(&self, id: Uuid) -> &str {
        self.members.get(&id).map_or("Someone", |m| m.name.as_str())
    }

    fn log(&mut self, kind: ActivityKind, message: String, now: DateTime<Utc>) {
        self.activity.insert(0, ActivityItem::new(kind, message, now));
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn ensure_positive_amount(amount: f64) -> ResultEngine<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

fn ensure_group_member(group: &Group, member_id: Uuid) -> ResultEngine<()> {
    if !group.contains(member_id) {
        return Err(EngineError::UnknownMember(member_id.to_string()));
    }
    Ok(())
}

fn ensure_split_members(group: &Group, split: &SplitRule) -> ResultEngine<()> {
    if let Some(shares) = split.shares() {
        for id in shares.keys() {
            if !group.contains(*id) {
                return Err(EngineError::UnknownMember(id.to_string()));
            }
        }
    }
    Ok(())
}

fn validate_rule(rule: &RecurrenceRule) -> ResultEngine<()> {
    if rule.interval < 1 {
        return Err(EngineError::InvalidRule(
            "interval must be >= 1".to_string(),
        ));
    }
    if let Some(end) = rule.end_date
        && end < rule.start_date
    {
        return Err(EngineError::InvalidRule(
            "end date precedes start date".to_string(),
        ));
    }
    if rule.count == Some(0) {
        return Err(EngineError::InvalidRule(
            "count must be >= 1 when set".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn state_with_group(names: &[&str]) -> (State, Uuid) {
        let mut state = State::new("You");
        let now = Utc::now();
        for name in names {
            state.apply(Action::AddMember { name: (*name).to_string() }, now)
                .unwrap();
        }
        state
            .apply(
                Action::AddGroup {
                    name: "Trip".to_string(),
                    member_ids: Vec::new(),
                    currency: None,
                },
                now,
            )
            .unwrap();
        let group_id = state.group_order[0];
        (state, group_id)
    }

    #[test]
    fn empty_member_list_defaults_to_everyone() {
        let (state, group_id) = state_with_group(&["Alex", "Sam"]);
        assert_eq!(state.groups[&group_id].member_ids.len(), 3);
    }

    #[test]
    fn duplicate_member_names_are_rejected() {
        let mut state = State::new("You");
        let now = Utc::now();
        state
            .apply(Action::AddMember { name: "Alex".to_string() }, now)
            .unwrap();
        let err = state
            .apply(Action::AddMember { name: "Alex".to_string() }, now)
            .unwrap_err();
        assert_eq!(err, EngineError::ExistingKey("Alex".to_string()));
    }

    #[test]
    fn expense_payer_must_belong_to_the_group() {
        let (mut state, group_id) = state_with_group(&["Alex"]);
        let stranger = Uuid::new_v4();
        let err = state
            .apply(
                Action::AddExpense(AddExpense {
                    group_id,
                    description: "Dinner".to_string(),
                    amount: 10.0,
                    paid_by: Some(stranger),
                    split: SplitRule::Equal,
                }),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownMember(stranger.to_string()));
    }

    #[test]
    fn split_share_keys_must_belong_to_the_group() {
        let (mut state, group_id) = state_with_group(&["Alex"]);
        let stranger = Uuid::new_v4();
        let err = state
            .apply(
                Action::AddExpense(AddExpense {
                    group_id,
                    description: "Dinner".to_string(),
                    amount: 10.0,
                    paid_by: None,
                    split: SplitRule::Amount(HashMap::from([(stranger, 10.0)])),
                }),
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownMember(stranger.to_string()));
    }

    #[test]
    fn nonpositive_amounts_are_rejected() {
        let (mut state, group_id) = state_with_group(&["Alex"]);
        for amount in [0.0, -5.0, f64::NAN] {
            let result = state.apply(
                Action::AddExpense(AddExpense {
                    group_id,
                    description: "Dinner".to_string(),
                    amount,
                    paid_by: None,
                    split: SplitRule::Equal,
                }),
                Utc::now(),
            );
            assert!(result.is_err());
        }
    }

    #[test]
    fn actions_append_to_the_activity_feed_newest_first() {
        let (mut state, group_id) = state_with_group(&["Alex"]);
        state
            .apply(
                Action::AddExpense(AddExpense {
                    group_id,
                    description: "Dinner".to_string(),
                    amount: 10.0,
                    paid_by: None,
                    split: SplitRule::Equal,
                }),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(state.activity[0].kind, ActivityKind::ExpenseAdded);
        assert!(state.activity[0].message.contains("Dinner"));
        // Group creation sits below the newer entry.
        assert_eq!(
            state.activity.last().map(|a| a.kind),
            Some(ActivityKind::MemberAdded)
        );
    }

    #[test]
    fn delete_expense_requires_a_known_id() {
        let (mut state, _) = state_with_group(&[]);
        let id = Uuid::new_v4();
        let err = state
            .apply(Action::DeleteExpense { id }, Utc::now())
            .unwrap_err();
        assert_eq!(err, EngineError::KeyNotFound(id.to_string()));
    }

    #[test]
    fn edit_expense_keeps_unset_fields() {
        let (mut state, group_id) = state_with_group(&["Alex"]);
        state
            .apply(
                Action::AddExpense(AddExpense {
                    group_id,
                    description: "Dinner".to_string(),
                    amount: 10.0,
                    paid_by: None,
                    split: SplitRule::Equal,
                }),
                Utc::now(),
            )
            .unwrap();
        let id = *state.expenses.keys().next().unwrap();
        state
            .apply(
                Action::EditExpense(EditExpense {
                    id,
                    amount: Some(12.0),
                    ..EditExpense::default()
                }),
                Utc::now(),
            )
            .unwrap();
        let expense = &state.expenses[&id];
        assert_eq!(expense.amount, 12.0);
        assert_eq!(expense.description, "Dinner");
    }

    #[test]
    fn recurring_rule_is_validated_on_insert() {
        let (mut state, group_id) = state_with_group(&["Alex"]);
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let rule = RecurrenceRule {
            frequency: crate::recurring::RecurrenceFrequency::Monthly,
            interval: 0,
            start_date: start,
            end_date: None,
            count: None,
        };
        let err = state
            .apply(
                Action::AddRecurring(AddRecurring {
                    group_id,
                    description: "Rent".to_string(),
                    amount: 100.0,
                    paid_by: None,
                    split: SplitRule::Equal,
                    rule,
                }),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRule(_)));
    }
}
