//! Event store errors
//!
//! Distinct from `domain::DomainError`: the aggregate's preconditions never
//! touch the database, and the store never second-guesses a precondition.
//! The store only ever raises `ConcurrencyConflict`, wrapping any integrity
//! violation it cannot otherwise distinguish; anything else is a plain
//! infrastructure failure and stays a `sqlx::Error` all the way to the HTTP
//! boundary, where it becomes a 5xx.

use thiserror::Error;

/// Errors raised by the durable per-stream append log.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Optimistic-concurrency loss, or a unique-constraint violation at
    /// commit time that the store does not distinguish from one.
    #[error("concurrency conflict on stream {stream_id}")]
    ConcurrencyConflict { stream_id: String },

    /// A stored event failed to decode back into `AccountEvent`: a corrupt
    /// or hand-edited row, not a caller error.
    #[error("corrupt stored event: {0}")]
    Decode(String),

    /// A caller-supplied `occurred_at` did not parse as `"now"` or one of
    /// the accepted ISO8601 forms.
    #[error("unparseable occurred_at: {0}")]
    InvalidTimestamp(String),

    /// Any other database failure: connection loss, timeout, syntax error.
    /// Programmer/infra error, not a domain outcome.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EventStoreError {
    /// Whether a caller could plausibly recover by retrying the same
    /// read-modify-write cycle (re-load, re-decide, re-append).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_conflict_is_retryable() {
        let err = EventStoreError::ConcurrencyConflict { stream_id: "a1".to_string() };
        assert!(err.is_retryable());
    }

    #[test]
    fn decode_failure_is_not_retryable() {
        let err = EventStoreError::Decode("missing field".to_string());
        assert!(!err.is_retryable());
    }
}
