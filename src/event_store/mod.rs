//! Event store module
//!
//! Durable per-stream append log on top of Postgres: optimistic concurrency
//! control, idempotent retries, and schema upcasting on read. The only
//! conflict condition this module ever raises is
//! `EventStoreError::ConcurrencyConflict`. Anything else is an
//! infrastructure failure and bubbles up as `EventStoreError::Database`.

mod envelope;
mod error;
mod repository;
mod upcaster;

pub use envelope::StoredEvent;
pub use error::EventStoreError;
pub use repository::EventStore;
