//! Aggregate module
//!
//! The account aggregate: a pure fold (`apply`) and a pure decision function
//! (`decide`), with no I/O anywhere in this module.

pub mod account;

pub use account::Account;

use crate::domain::{AccountEvent, Command, DecidedEvent, DomainError};

/// An aggregate that can be rebuilt by folding its event stream.
pub trait Aggregate: Sized + Default {
    type Event;

    fn aggregate_type() -> &'static str;

    /// Apply a single event, returning the updated state.
    fn apply(self, event: Self::Event) -> Self;
}

/// Fold a full event history onto an empty aggregate.
pub fn fold(history: impl IntoIterator<Item = AccountEvent>) -> Account {
    history.into_iter().fold(Account::default(), Account::apply)
}

/// Decide which events, if any, a command produces against the given state.
/// Dispatches exhaustively over the closed `Command` sum so a new command
/// variant fails to compile here until it is handled.
pub fn decide(state: &Account, command: Command) -> Result<Vec<DecidedEvent>, DomainError> {
    match command {
        Command::CreateAccount(cmd) => state.decide_create(cmd),
        Command::ChangePlan(cmd) => state.decide_change_plan(cmd),
        Command::RecordUsage(cmd) => state.decide_record_usage(cmd),
        Command::ResetPeriod(cmd) => state.decide_reset_period(cmd),
        Command::SuspendAccount(cmd) => state.decide_suspend(cmd),
        Command::ReinstateAccount(cmd) => state.decide_reinstate(cmd),
    }
}
