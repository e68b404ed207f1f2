//! Command handlers module
//!
//! Orchestrates the account aggregate, event store, and projection behind
//! a single stateless service used by the HTTP surface.

mod account_service;

pub use account_service::{AccountService, AccountState, StateSource};
