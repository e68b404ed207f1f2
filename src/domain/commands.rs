//! Command definitions
//!
//! Commands represent intentions to change the state of a single account
//! stream. `decide` dispatches on this closed sum exhaustively, so adding a
//! command variant without updating `decide` fails to compile.

use super::types::Meter;

/// Intention to create a new account stream.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub account_id: String,
    pub initial_plan_id: String,
    pub period: String,
}

/// Intention to change the active plan on an existing account.
#[derive(Debug, Clone)]
pub struct ChangePlan {
    pub account_id: String,
    pub plan_id: String,
}

/// Intention to record metered usage against the current period.
#[derive(Debug, Clone)]
pub struct RecordUsage {
    pub account_id: String,
    pub meter: Meter,
    pub units: i64,
    /// `"now"`, or a caller-supplied ISO8601 timestamp. Resolved by the
    /// event store at persistence time, never by the aggregate.
    pub occurred_at: String,
    pub idempotency_key: String,
}

/// Intention to roll the account into a new billing period, clearing usage.
#[derive(Debug, Clone)]
pub struct ResetPeriod {
    pub account_id: String,
    pub new_period: String,
}

/// Intention to suspend an account (e.g. for fraud or non-payment).
#[derive(Debug, Clone)]
pub struct SuspendAccount {
    pub account_id: String,
    pub reason: String,
}

/// Intention to reinstate a previously suspended account.
#[derive(Debug, Clone)]
pub struct ReinstateAccount {
    pub account_id: String,
}

/// The closed sum of all write commands the account service accepts.
#[derive(Debug, Clone)]
pub enum Command {
    CreateAccount(CreateAccount),
    ChangePlan(ChangePlan),
    RecordUsage(RecordUsage),
    ResetPeriod(ResetPeriod),
    SuspendAccount(SuspendAccount),
    ReinstateAccount(ReinstateAccount),
}

impl Command {
    /// The account id this command targets, regardless of variant.
    pub fn account_id(&self) -> &str {
        match self {
            Command::CreateAccount(c) => &c.account_id,
            Command::ChangePlan(c) => &c.account_id,
            Command::RecordUsage(c) => &c.account_id,
            Command::ResetPeriod(c) => &c.account_id,
            Command::SuspendAccount(c) => &c.account_id,
            Command::ReinstateAccount(c) => &c.account_id,
        }
    }
}
