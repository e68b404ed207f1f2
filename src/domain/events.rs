//! Domain events
//!
//! Events are immutable facts already decided by the aggregate. Each variant
//! carries only its payload. The envelope fields that the store is
//! responsible for (`event_id`, `stream_version`, `occurred_at`,
//! `idempotency_key`) live in `event_store::EventEnvelope`, not here.
//! `AccountEvent` itself stays a pure, storage-agnostic value.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::DomainError;
use super::types::Meter;

/// Account-related events, one per row in the durable log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccountEvent {
    AccountCreated { plan_id: String, period: String },
    PlanChanged { plan_id: String },
    UsageRecorded { meter: Meter, units: i64, source: String },
    PeriodReset { period: String },
    AccountSuspended { reason: String },
    AccountReinstated,
}

impl AccountEvent {
    /// The stored `event_type` string.
    pub fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountCreated { .. } => "AccountCreated",
            AccountEvent::PlanChanged { .. } => "PlanChanged",
            AccountEvent::UsageRecorded { .. } => "UsageRecorded",
            AccountEvent::PeriodReset { .. } => "PeriodReset",
            AccountEvent::AccountSuspended { .. } => "AccountSuspended",
            AccountEvent::AccountReinstated => "AccountReinstated",
        }
    }

    /// The schema version this variant is always emitted at. `UsageRecorded`
    /// is the only event with more than one schema version in the log; new
    /// ones are always written at the latest (v2, `source` present).
    pub fn schema_version(&self) -> i32 {
        match self {
            AccountEvent::UsageRecorded { .. } => 2,
            _ => 1,
        }
    }

    /// Encode just the payload (no `type`/`schema_version` wrapper; those
    /// are separate columns in the `events` table).
    pub fn to_payload(&self) -> Value {
        match self {
            AccountEvent::AccountCreated { plan_id, period } => {
                json!({ "plan_id": plan_id, "period": period })
            }
            AccountEvent::PlanChanged { plan_id } => json!({ "plan_id": plan_id }),
            AccountEvent::UsageRecorded { meter, units, source } => {
                json!({ "meter": meter, "units": units, "source": source })
            }
            AccountEvent::PeriodReset { period } => json!({ "period": period }),
            AccountEvent::AccountSuspended { reason } => json!({ "reason": reason }),
            AccountEvent::AccountReinstated => json!({}),
        }
    }

    /// Decode a stored `(event_type, payload)` pair back into a typed event.
    /// `payload` is assumed already normalized by the upcaster. This never
    /// sees a v1 `UsageRecorded` payload.
    pub fn from_stored(event_type: &str, payload: &Value) -> Result<Self, DomainError> {
        let field = |key: &str| -> Result<String, DomainError> {
            payload
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    DomainError::InvariantViolation(format!(
                        "event {event_type} missing field {key}"
                    ))
                })
        };

        Ok(match event_type {
            "AccountCreated" => AccountEvent::AccountCreated {
                plan_id: field("plan_id")?,
                period: field("period")?,
            },
            "PlanChanged" => AccountEvent::PlanChanged { plan_id: field("plan_id")? },
            "UsageRecorded" => {
                let meter_str = field("meter")?;
                let meter: Meter = meter_str.parse().map_err(|_| {
                    DomainError::InvariantViolation(format!("unknown meter: {meter_str}"))
                })?;
                let units = payload
                    .get("units")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| {
                        DomainError::InvariantViolation("UsageRecorded missing units".into())
                    })?;
                let source = field("source").unwrap_or_else(|_| "unknown".to_string());
                AccountEvent::UsageRecorded { meter, units, source }
            }
            "PeriodReset" => AccountEvent::PeriodReset { period: field("period")? },
            "AccountSuspended" => AccountEvent::AccountSuspended { reason: field("reason")? },
            "AccountReinstated" => AccountEvent::AccountReinstated,
            other => {
                return Err(DomainError::InvariantViolation(format!(
                    "unknown event type: {other}"
                )))
            }
        })
    }
}

/// How the store should resolve `occurred_at` at persistence time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccurredAt {
    Now,
    At(String),
}

/// An event decided by the aggregate, paired with the envelope metadata the
/// store needs but which the aggregate has no business computing itself
/// (timestamps, idempotency key).
#[derive(Debug, Clone)]
pub struct DecidedEvent {
    pub event: AccountEvent,
    pub occurred_at: OccurredAt,
    pub idempotency_key: Option<String>,
}

impl DecidedEvent {
    pub fn new(event: AccountEvent) -> Self {
        Self { event, occurred_at: OccurredAt::Now, idempotency_key: None }
    }

    pub fn at(mut self, occurred_at: impl Into<String>) -> Self {
        self.occurred_at = OccurredAt::At(occurred_at.into());
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
