//! Database bootstrap
//!
//! Creates the two tables the event store and projection need if they are
//! absent. This replaces a dedicated migration tool: the crate runs
//! against an empty database with no external migration step.

use sqlx::PgPool;

/// Simple connectivity check, used by `/healthz`.
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Idempotently create `events` and `account_current` if they don't exist.
pub async fn bootstrap_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            event_id UUID PRIMARY KEY,
            stream_id TEXT NOT NULL,
            stream_version BIGINT NOT NULL,
            event_type TEXT NOT NULL,
            event_schema_version INTEGER NOT NULL,
            occurred_at TIMESTAMPTZ NOT NULL,
            idempotency_key TEXT,
            payload JSONB NOT NULL,
            metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
            UNIQUE (stream_id, stream_version),
            UNIQUE (stream_id, idempotency_key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS events_stream_id_idx ON events (stream_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS account_current (
            account_id TEXT PRIMARY KEY,
            stream_version BIGINT NOT NULL,
            status TEXT NOT NULL,
            plan_id TEXT,
            period TEXT,
            used JSONB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
