//! Projection module
//!
//! Maintains `account_current`, a denormalized read model kept in lockstep
//! with the event log by updating it inside the same transaction as every
//! append.

mod service;

pub use service::{get_by_id, upsert, ProjectionRow};
