//! Domain module
//!
//! Core domain types and business logic: the closed set of commands and
//! events, the meter/period value types, and the domain error enum. Nothing
//! in this module performs I/O.

pub mod commands;
pub mod context;
pub mod error;
pub mod events;
pub mod types;

pub use commands::{
    ChangePlan, Command, CreateAccount, ReinstateAccount, RecordUsage, ResetPeriod, SuspendAccount,
};
pub use context::OperationContext;
pub use error::DomainError;
pub use events::{AccountEvent, DecidedEvent, OccurredAt};
pub use types::Meter;
