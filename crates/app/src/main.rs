//! Evenly host CLI.
//!
//! Owns what the engine never touches: the JSON snapshot on disk, logging,
//! and the command surface. Every run loads the snapshot, applies at most a
//! handful of store actions, prints derived results and writes the snapshot
//! back when something changed.
use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{
    Action, AddExpense, AddRecurring, AddSettlement, EditExpense, RecurrenceFrequency,
    RecurrenceRule, SplitRule, State,
};
use uuid::Uuid;

mod settings;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "evenly")]
#[command(about = "Split group expenses and settle up")]
struct Cli {
    /// Snapshot file (also set via `state_path` in evenly.toml).
    #[arg(long, env = "EVENLY_STATE")]
    state: Option<PathBuf>,

    /// Print results as JSON instead of text.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Member(Member),
    Group(Group),
    Expense(Expense),
    Recurring(Recurring),
    Settlement(Settlement),
    /// Show a group's member balances.
    Balances(GroupArg),
    /// Suggest the payments that settle a group.
    SettleUp(GroupArg),
    /// Show what you owe and are owed.
    Totals(TotalsArgs),
    /// Show the activity feed, newest first.
    Activity(ActivityArgs),
    /// Dump the snapshot to a timestamped export file.
    Export,
}

#[derive(Args, Debug)]
struct Member {
    #[command(subcommand)]
    command: MemberCommand,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    Add { name: String },
    List,
}

#[derive(Args, Debug)]
struct Group {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    Add(GroupAddArgs),
    List,
    Rename {
        group: String,
        name: String,
    },
    SetCurrency {
        group: String,
        /// Clears the override when omitted.
        currency: Option<String>,
    },
}

#[derive(Args, Debug)]
struct GroupAddArgs {
    name: String,
    /// Member names or ids; everyone when omitted.
    #[arg(long, value_delimiter = ',')]
    members: Vec<String>,
    #[arg(long)]
    currency: Option<String>,
}

#[derive(Args, Debug)]
struct Expense {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Add(ExpenseAddArgs),
    Edit(ExpenseEditArgs),
    Delete { id: Uuid },
    List(GroupArg),
}

#[derive(Args, Debug)]
struct ExpenseAddArgs {
    #[arg(long)]
    group: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    amount: f64,
    /// Defaults to you.
    #[arg(long)]
    paid_by: Option<String>,
    #[arg(long, value_enum, default_value = "equal")]
    split: SplitKind,
    /// Raw share per member as `name=value`; only for amount/percent splits.
    #[arg(long = "share")]
    shares: Vec<String>,
}

#[derive(Args, Debug)]
struct ExpenseEditArgs {
    id: Uuid,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    amount: Option<f64>,
    #[arg(long)]
    paid_by: Option<String>,
    #[arg(long, value_enum)]
    split: Option<SplitKind>,
    #[arg(long = "share")]
    shares: Vec<String>,
}

#[derive(Args, Debug)]
struct Recurring {
    #[command(subcommand)]
    command: RecurringCommand,
}

#[derive(Subcommand, Debug)]
enum RecurringCommand {
    Add(RecurringAddArgs),
    List,
    Toggle {
        id: Uuid,
        #[arg(long)]
        active: bool,
    },
    Delete { id: Uuid },
    /// Spawn expenses for every recurring charge that came due.
    Process,
}

#[derive(Args, Debug)]
struct RecurringAddArgs {
    #[arg(long)]
    group: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    amount: f64,
    #[arg(long)]
    paid_by: Option<String>,
    #[arg(long, value_enum)]
    frequency: Frequency,
    #[arg(long, default_value_t = 1)]
    interval: u32,
    /// `YYYY-MM-DD`; defaults to today.
    #[arg(long)]
    start: Option<String>,
    /// `YYYY-MM-DD`.
    #[arg(long)]
    end: Option<String>,
    #[arg(long)]
    count: Option<u32>,
}

#[derive(Args, Debug)]
struct Settlement {
    #[command(subcommand)]
    command: SettlementCommand,
}

#[derive(Subcommand, Debug)]
enum SettlementCommand {
    Add(SettlementAddArgs),
    Delete { id: Uuid },
    List(GroupArg),
}

#[derive(Args, Debug)]
struct SettlementAddArgs {
    #[arg(long)]
    group: String,
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long)]
    amount: f64,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct GroupArg {
    group: String,
}

#[derive(Args, Debug)]
struct TotalsArgs {
    /// Restrict to one group instead of the cross-group gross totals.
    #[arg(long)]
    group: Option<String>,
}

#[derive(Args, Debug)]
struct ActivityArgs {
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SplitKind {
    Equal,
    Amount,
    Percent,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<Frequency> for RecurrenceFrequency {
    fn from(value: Frequency) -> Self {
        match value {
            Frequency::Daily => Self::Daily,
            Frequency::Weekly => Self::Weekly,
            Frequency::Monthly => Self::Monthly,
            Frequency::Yearly => Self::Yearly,
        }
    }
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "evenly={level},engine={level}",
            level = settings.level
        ))
        .init();

    let state_path = cli
        .state
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.state_path));
    let mut state = load_state(&state_path, &settings.display_name)?;

    let mutated = run(&cli, &mut state, Utc::now())?;
    if mutated {
        save_state(&state_path, &state)?;
    }
    Ok(())
}

fn run(cli: &Cli, state: &mut State, now: DateTime<Utc>) -> Result<bool, BoxError> {
    match &cli.command {
        Command::Member(member) => match &member.command {
            MemberCommand::Add { name } => {
                state.apply(Action::AddMember { name: name.clone() }, now)?;
                tracing::info!("added member {name}");
                Ok(true)
            }
            MemberCommand::List => {
                let mut members: Vec<_> = state.members.values().collect();
                members.sort_by(|a, b| a.name.cmp(&b.name));
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&members)?);
                } else {
                    for member in members {
                        let you = if member.id == state.current_member_id {
                            " (you)"
                        } else {
                            ""
                        };
                        println!("{}  {}{you}", member.id, member.name);
                    }
                }
                Ok(false)
            }
        },
        Command::Group(group) => match &group.command {
            GroupCommand::Add(args) => {
                let member_ids = args
                    .members
                    .iter()
                    .map(|reference| resolve_member(state, reference))
                    .collect::<Result<Vec<_>, _>>()?;
                state.apply(
                    Action::AddGroup {
                        name: args.name.clone(),
                        member_ids,
                        currency: args.currency.clone(),
                    },
                    now,
                )?;
                tracing::info!("created group {}", args.name);
                Ok(true)
            }
            GroupCommand::List => {
                if cli.json {
                    let groups: Vec<_> = state.groups_in_order().collect();
                    println!("{}", serde_json::to_string_pretty(&groups)?);
                } else {
                    for group in state.groups_in_order() {
                        let currency = group
                            .currency
                            .as_deref()
                            .unwrap_or(&state.settings.currency);
                        println!(
                            "{}  {}  {} members  {currency}",
                            group.id,
                            group.name,
                            group.member_ids.len()
                        );
                    }
                }
                Ok(false)
            }
            GroupCommand::Rename { group, name } => {
                let id = resolve_group(state, group)?;
                state.apply(Action::RenameGroup { id, name: name.clone() }, now)?;
                Ok(true)
            }
            GroupCommand::SetCurrency { group, currency } => {
                let id = resolve_group(state, group)?;
                state.apply(
                    Action::SetGroupCurrency { id, currency: currency.clone() },
                    now,
                )?;
                Ok(true)
            }
        },
        Command::Expense(expense) => match &expense.command {
            ExpenseCommand::Add(args) => {
                let group_id = resolve_group(state, &args.group)?;
                let paid_by = args
                    .paid_by
                    .as_deref()
                    .map(|reference| resolve_member(state, reference))
                    .transpose()?;
                let split = build_split(state, args.split, &args.shares)?;
                state.apply(
                    Action::AddExpense(AddExpense {
                        group_id,
                        description: args.description.clone(),
                        amount: args.amount,
                        paid_by,
                        split,
                    }),
                    now,
                )?;
                Ok(true)
            }
            ExpenseCommand::Edit(args) => {
                let paid_by = args
                    .paid_by
                    .as_deref()
                    .map(|reference| resolve_member(state, reference))
                    .transpose()?;
                let split = args
                    .split
                    .map(|kind| build_split(state, kind, &args.shares))
                    .transpose()?;
                state.apply(
                    Action::EditExpense(EditExpense {
                        id: args.id,
                        description: args.description.clone(),
                        amount: args.amount,
                        paid_by,
                        split,
                    }),
                    now,
                )?;
                Ok(true)
            }
            ExpenseCommand::Delete { id } => {
                state.apply(Action::DeleteExpense { id: *id }, now)?;
                Ok(true)
            }
            ExpenseCommand::List(args) => {
                let group_id = resolve_group(state, &args.group)?;
                let expenses = state.expenses_for_group(group_id);
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&expenses)?);
                } else {
                    for expense in expenses {
                        println!(
                            "{}  {}  {:>10.2}  paid by {}  {}",
                            expense.id,
                            expense.created_at.format("%Y-%m-%d"),
                            expense.amount,
                            member_name(state, expense.paid_by),
                            expense.description,
                        );
                    }
                }
                Ok(false)
            }
        },
        Command::Recurring(recurring) => match &recurring.command {
            RecurringCommand::Add(args) => {
                let group_id = resolve_group(state, &args.group)?;
                let paid_by = args
                    .paid_by
                    .as_deref()
                    .map(|reference| resolve_member(state, reference))
                    .transpose()?;
                let start_date = match &args.start {
                    Some(raw) => parse_date(raw)?,
                    None => now,
                };
                let end_date = args.end.as_deref().map(parse_date).transpose()?;
                state.apply(
                    Action::AddRecurring(AddRecurring {
                        group_id,
                        description: args.description.clone(),
                        amount: args.amount,
                        paid_by,
                        split: SplitRule::Equal,
                        rule: RecurrenceRule {
                            frequency: args.frequency.into(),
                            interval: args.interval,
                            start_date,
                            end_date,
                            count: args.count,
                        },
                    }),
                    now,
                )?;
                Ok(true)
            }
            RecurringCommand::List => {
                let charges = state.recurring_in_order();
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&charges)?);
                } else {
                    for charge in charges {
                        let status = if charge.active { "active" } else { "paused" };
                        println!(
                            "{}  {}  {:>10.2}  every {} {:?}  next {}  {status}",
                            charge.id,
                            charge.description,
                            charge.amount,
                            charge.rule.interval,
                            charge.rule.frequency,
                            charge.next_occurrence_at.format("%Y-%m-%d"),
                        );
                    }
                }
                Ok(false)
            }
            RecurringCommand::Toggle { id, active } => {
                state.apply(
                    Action::ToggleRecurringActive { id: *id, active: *active },
                    now,
                )?;
                Ok(true)
            }
            RecurringCommand::Delete { id } => {
                state.apply(Action::DeleteRecurring { id: *id }, now)?;
                Ok(true)
            }
            RecurringCommand::Process => {
                let before = state.expenses.len();
                state.apply(Action::ProcessRecurring, now)?;
                let spawned = state.expenses.len() - before;
                tracing::info!("spawned {spawned} recurring expenses");
                // Processing may also deactivate exhausted charges, so the
                // snapshot is always written back.
                Ok(true)
            }
        },
        Command::Settlement(settlement) => match &settlement.command {
            SettlementCommand::Add(args) => {
                let group_id = resolve_group(state, &args.group)?;
                let from_member_id = resolve_member(state, &args.from)?;
                let to_member_id = resolve_member(state, &args.to)?;
                state.apply(
                    Action::AddSettlement(AddSettlement {
                        group_id,
                        from_member_id,
                        to_member_id,
                        amount: args.amount,
                        note: args.note.clone(),
                    }),
                    now,
                )?;
                Ok(true)
            }
            SettlementCommand::Delete { id } => {
                state.apply(Action::DeleteSettlement { id: *id }, now)?;
                Ok(true)
            }
            SettlementCommand::List(args) => {
                let group_id = resolve_group(state, &args.group)?;
                let settlements = state.settlements_for_group(group_id);
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&settlements)?);
                } else {
                    for settlement in settlements {
                        println!(
                            "{}  {}  {} → {}  {:>10.2}",
                            settlement.id,
                            settlement.created_at.format("%Y-%m-%d"),
                            member_name(state, settlement.from_member_id),
                            member_name(state, settlement.to_member_id),
                            settlement.amount,
                        );
                    }
                }
                Ok(false)
            }
        },
        Command::Balances(args) => {
            let group_id = resolve_group(state, &args.group)?;
            print_balances(cli, state, group_id)?;
            Ok(false)
        }
        Command::SettleUp(args) => {
            let group_id = resolve_group(state, &args.group)?;
            print_settle_up(cli, state, group_id)?;
            Ok(false)
        }
        Command::Totals(args) => {
            let totals = match &args.group {
                Some(group) => {
                    let group_id = resolve_group(state, group)?;
                    state.group_totals(group_id, state.current_member_id)?
                }
                None => state.user_totals(state.current_member_id),
            };
            let view = api_types::totals::TotalsView {
                member_id: state.current_member_id,
                owed: totals.owed,
                owes: totals.owes,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("You are owed {:.2}", view.owed);
                println!("You owe {:.2}", view.owes);
            }
            Ok(false)
        }
        Command::Activity(args) => {
            let items: Vec<api_types::activity::ActivityView> = state
                .activity
                .iter()
                .take(args.limit)
                .map(|item| api_types::activity::ActivityView {
                    kind: format!("{:?}", item.kind),
                    message: item.message.clone(),
                    created_at: item.created_at,
                })
                .collect();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                for item in items {
                    println!("{}  {}", item.created_at.format("%Y-%m-%d %H:%M"), item.message);
                }
            }
            Ok(false)
        }
        Command::Export => {
            let stamp = Utc::now()
                .to_rfc3339()
                .replace([':', '.'], "-");
            let path = PathBuf::from(format!("evenly-export-{stamp}.json"));
            save_state(&path, state)?;
            println!("{}", path.display());
            Ok(false)
        }
    }
}

fn print_balances(cli: &Cli, state: &State, group_id: Uuid) -> Result<(), BoxError> {
    let balances = state.group_balances(group_id)?;
    let group = state
        .groups
        .get(&group_id)
        .ok_or_else(|| format!("unknown group: {group_id}"))?;

    // Highest balance first, creditors on top.
    let mut ordered = group.member_ids.clone();
    ordered.sort_by(|a, b| {
        let left = balances.get(a).copied().unwrap_or(0.0);
        let right = balances.get(b).copied().unwrap_or(0.0);
        right.total_cmp(&left)
    });

    let view = api_types::balance::GroupBalances {
        group_id,
        currency: group
            .currency
            .clone()
            .unwrap_or_else(|| state.settings.currency.clone()),
        balances: ordered
            .iter()
            .map(|id| api_types::balance::BalanceView {
                member_id: *id,
                name: member_name(state, *id).to_string(),
                amount: balances.get(id).copied().unwrap_or(0.0),
            })
            .collect(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        for balance in &view.balances {
            println!("{:<20} {:>10.2}", balance.name, balance.amount);
        }
    }
    Ok(())
}

fn print_settle_up(cli: &Cli, state: &State, group_id: Uuid) -> Result<(), BoxError> {
    let suggestions = state.settle_up(group_id)?;
    let view = api_types::settle::SettleUp {
        group_id,
        suggestions: suggestions
            .iter()
            .map(|s| api_types::settle::SuggestionView {
                from_member_id: s.from_member_id,
                from_name: member_name(state, s.from_member_id).to_string(),
                to_member_id: s.to_member_id,
                to_name: member_name(state, s.to_member_id).to_string(),
                amount: s.amount,
            })
            .collect(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else if view.suggestions.is_empty() {
        println!("All settled up.");
    } else {
        for suggestion in &view.suggestions {
            println!(
                "{} → {}  {:>10.2}",
                suggestion.from_name, suggestion.to_name, suggestion.amount
            );
        }
    }
    Ok(())
}

fn load_state(path: &Path, display_name: &str) -> Result<State, BoxError> {
    if path.exists() {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    } else {
        tracing::info!("no snapshot at {}, starting fresh", path.display());
        Ok(State::new(display_name))
    }
}

fn save_state(path: &Path, state: &State) -> Result<(), BoxError> {
    let blob = serde_json::to_string_pretty(state)?;
    fs::write(path, blob)?;
    tracing::debug!("snapshot written to {}", path.display());
    Ok(())
}

fn resolve_member(state: &State, reference: &str) -> Result<Uuid, BoxError> {
    if let Some(member) = state.members.values().find(|m| m.name == reference) {
        return Ok(member.id);
    }
    Uuid::parse_str(reference).map_err(|_| format!("unknown member: {reference}").into())
}

fn resolve_group(state: &State, reference: &str) -> Result<Uuid, BoxError> {
    if let Some(group) = state.groups.values().find(|g| g.name == reference) {
        return Ok(group.id);
    }
    Uuid::parse_str(reference).map_err(|_| format!("unknown group: {reference}").into())
}

fn member_name(state: &State, id: Uuid) -> &str {
    state.members.get(&id).map_or("Someone", |m| m.name.as_str())
}

fn build_split(
    state: &State,
    kind: SplitKind,
    raw_shares: &[String],
) -> Result<SplitRule, BoxError> {
    match kind {
        SplitKind::Equal => Ok(SplitRule::Equal),
        SplitKind::Amount => Ok(SplitRule::Amount(parse_shares(state, raw_shares)?)),
        SplitKind::Percent => Ok(SplitRule::Percent(parse_shares(state, raw_shares)?)),
    }
}

fn parse_shares(
    state: &State,
    raw_shares: &[String],
) -> Result<std::collections::HashMap<Uuid, f64>, BoxError> {
    let mut shares = std::collections::HashMap::new();
    for raw in raw_shares {
        let (reference, value) = raw
            .split_once('=')
            .ok_or_else(|| format!("share must be `member=value`, got `{raw}`"))?;
        let member = resolve_member(state, reference.trim())?;
        let value: f64 = value.trim().parse()?;
        shares.insert(member, value);
    }
    Ok(shares)
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, BoxError> {
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")?;
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date: {raw}"))?;
    Ok(midnight.and_utc())
}
