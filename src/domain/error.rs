//! Domain error types
//!
//! Pure domain errors that don't depend on infrastructure. `decide` only
//! ever raises these two, never performs I/O; optimistic-concurrency and
//! database failures are a separate concern owned by
//! `event_store::EventStoreError`.

use thiserror::Error;

/// Domain-level errors, independent of the web/persistence layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// The operation requires an account that has not been created.
    #[error("account not found: {0}")]
    NotFound(String),

    /// The command was rejected by one of the aggregate's preconditions.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    pub fn not_found(account_id: impl Into<String>) -> Self {
        Self::NotFound(account_id.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}
