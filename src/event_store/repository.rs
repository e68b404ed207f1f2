//! Event Store Repository
//!
//! Durable per-stream append log: optimistic concurrency control, idempotent
//! retries, and a same-transaction projection update. This is the only
//! module in the crate that performs I/O on behalf of the aggregate.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::aggregate;
use crate::domain::{AccountEvent, DecidedEvent, OccurredAt};
use crate::projection;

use super::envelope::StoredEvent;
use super::error::EventStoreError;

const UNIQUE_VIOLATION: &str = "23505";

/// Durable append log for account streams, backed by Postgres.
#[derive(Debug, Clone)]
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Append `events` to `stream_id`, failing with `ConcurrencyConflict` if
    /// `expected_version` no longer matches the stream's current version.
    /// Returns the new highest `stream_version`.
    pub async fn append(
        &self,
        stream_id: &str,
        expected_version: i64,
        events: Vec<DecidedEvent>,
    ) -> Result<i64, EventStoreError> {
        if events.is_empty() {
            return Ok(expected_version);
        }

        let mut tx = self.pool.begin().await?;

        if let Some(key) = events[0].idempotency_key.as_deref() {
            if let Some(existing_version) =
                self.find_by_idempotency_key(&mut tx, stream_id, key).await?
            {
                tx.commit().await?;
                return Ok(existing_version);
            }
        }

        let current_version = self.current_version(&mut tx, stream_id).await?;
        if current_version != expected_version {
            return Err(EventStoreError::ConcurrencyConflict { stream_id: stream_id.to_string() });
        }

        for (offset, decided) in events.iter().enumerate() {
            let stream_version = current_version + 1 + offset as i64;
            let occurred_at = resolve_occurred_at(&decided.occurred_at)?;
            let idempotency_key = if offset == 0 { decided.idempotency_key.as_deref() } else { None };

            sqlx::query(
                r#"
                INSERT INTO events (
                    event_id, stream_id, stream_version, event_type,
                    event_schema_version, occurred_at, idempotency_key, payload, metadata
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(stream_id)
            .bind(stream_version)
            .bind(decided.event.event_type())
            .bind(decided.event.schema_version())
            .bind(occurred_at)
            .bind(idempotency_key)
            .bind(decided.event.to_payload())
            .bind(serde_json::json!({}))
            .execute(&mut *tx)
            .await
            .map_err(|e| classify(e, stream_id))?;
        }

        let new_version = current_version + events.len() as i64;
        let history = self.load_stream_tx(&mut tx, stream_id).await?;
        let state = aggregate::fold(
            history
                .iter()
                .map(StoredEvent::to_event)
                .collect::<Result<Vec<AccountEvent>, _>>()
                .map_err(|e| EventStoreError::Decode(e.to_string()))?,
        );
        projection::upsert(&mut tx, stream_id, new_version, &state).await?;

        tx.commit().await?;
        Ok(new_version)
    }

    /// All events for `stream_id`, `stream_version` ascending.
    pub async fn load_stream(&self, stream_id: &str) -> Result<Vec<StoredEvent>, EventStoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT event_id, stream_id, stream_version, event_type,
                   event_schema_version, occurred_at, idempotency_key, payload
            FROM events
            WHERE stream_id = $1
            ORDER BY stream_version ASC
            "#,
        )
        .bind(stream_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EventRow::into_stored).collect())
    }

    /// Events with `stream_version > since_version`, ascending.
    pub async fn load_stream_since(
        &self,
        stream_id: &str,
        since_version: i64,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT event_id, stream_id, stream_version, event_type,
                   event_schema_version, occurred_at, idempotency_key, payload
            FROM events
            WHERE stream_id = $1 AND stream_version > $2
            ORDER BY stream_version ASC
            "#,
        )
        .bind(stream_id)
        .bind(since_version)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EventRow::into_stored).collect())
    }

    async fn load_stream_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        stream_id: &str,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT event_id, stream_id, stream_version, event_type,
                   event_schema_version, occurred_at, idempotency_key, payload
            FROM events
            WHERE stream_id = $1
            ORDER BY stream_version ASC
            "#,
        )
        .bind(stream_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.into_iter().map(EventRow::into_stored).collect())
    }

    async fn current_version(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        stream_id: &str,
    ) -> Result<i64, EventStoreError> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(stream_version) FROM events WHERE stream_id = $1")
                .bind(stream_id)
                .fetch_one(&mut **tx)
                .await?;
        Ok(version.unwrap_or(0))
    }

    async fn find_by_idempotency_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        stream_id: &str,
        key: &str,
    ) -> Result<Option<i64>, EventStoreError> {
        let existing: Option<()> = sqlx::query_scalar(
            "SELECT 1 FROM events WHERE stream_id = $1 AND idempotency_key = $2",
        )
        .bind(stream_id)
        .bind(key)
        .fetch_optional(&mut **tx)
        .await?;

        if existing.is_none() {
            return Ok(None);
        }
        self.current_version(tx, stream_id).await.map(Some)
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: Uuid,
    stream_id: String,
    stream_version: i64,
    event_type: String,
    event_schema_version: i32,
    occurred_at: DateTime<Utc>,
    idempotency_key: Option<String>,
    payload: serde_json::Value,
}

impl EventRow {
    fn into_stored(self) -> StoredEvent {
        StoredEvent {
            event_id: self.event_id,
            stream_id: self.stream_id,
            stream_version: self.stream_version,
            event_type: self.event_type,
            schema_version: self.event_schema_version,
            occurred_at: self.occurred_at,
            idempotency_key: self.idempotency_key,
            payload: self.payload,
        }
    }
}

/// Map a commit-time failure to a conflict when it looks like one of our
/// two unique constraints, and to a plain infra error otherwise.
fn classify(e: sqlx::Error, stream_id: &str) -> EventStoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return EventStoreError::ConcurrencyConflict { stream_id: stream_id.to_string() };
        }
    }
    EventStoreError::Database(e)
}

/// Resolve the store-side timestamp for a decided event: `"now"` resolves
/// to the current instant; everything else must parse as ISO8601 with a
/// trailing `Z`, an explicit offset, or a naive datetime assumed UTC.
fn resolve_occurred_at(occurred_at: &OccurredAt) -> Result<DateTime<Utc>, EventStoreError> {
    match occurred_at {
        OccurredAt::Now => Ok(Utc::now()),
        OccurredAt::At(s) if s == "now" => Ok(Utc::now()),
        OccurredAt::At(s) => parse_timestamp(s),
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, EventStoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    Err(EventStoreError::InvalidTimestamp(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trailing_z() {
        let dt = parse_timestamp("2026-01-28T01:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-28T01:30:00+00:00");
    }

    #[test]
    fn parses_explicit_offset() {
        let dt = parse_timestamp("2026-01-28T03:30:00+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-28T01:30:00+00:00");
    }

    #[test]
    fn parses_naive_as_utc() {
        let dt = parse_timestamp("2026-01-28T01:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-28T01:30:00+00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("not-a-timestamp").is_err());
    }
}
