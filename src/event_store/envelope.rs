//! Stored event envelope
//!
//! The envelope fields the store owns and the aggregate never sees:
//! identity, ordering, and timing. `AccountEvent` itself stays a pure
//! payload; this wraps it with what a durable log needs around it.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{AccountEvent, DomainError};

use super::upcaster;

/// One row of the durable log, as read back from Postgres.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub stream_id: String,
    pub stream_version: i64,
    pub event_type: String,
    pub schema_version: i32,
    pub occurred_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
    pub payload: Value,
}

impl StoredEvent {
    /// Decode the envelope's payload into the closed event enum, after
    /// running it through the upcaster.
    pub fn to_event(&self) -> Result<AccountEvent, DomainError> {
        let (_, payload) = upcaster::upcast(&self.event_type, self.schema_version, &self.payload);
        AccountEvent::from_stored(&self.event_type, &payload)
    }

    /// The shape returned by `GET /v1/accounts/{id}/events`.
    pub fn to_json(&self) -> Value {
        let (schema_version, payload) =
            upcaster::upcast(&self.event_type, self.schema_version, &self.payload);
        serde_json::json!({
            "type": self.event_type,
            "schema_version": schema_version,
            "occurred_at": self.occurred_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "idempotency_key": self.idempotency_key,
            "payload": payload,
        })
    }
}
