//! Projection read/write
//!
//! `account_current` is a single-row-per-account denormalized view,
//! rebuilt by a full fold of the stream on every append (small-stream
//! assumption; see the design notes on incremental projection update).

use std::collections::HashMap;
use std::str::FromStr;

use sqlx::{PgPool, Postgres, Transaction};

use crate::aggregate::{account::AccountStatus, Account};
use crate::domain::Meter;

/// The `account_current` row, as read back for the HTTP surface.
#[derive(Debug, Clone)]
pub struct ProjectionRow {
    pub account_id: String,
    pub stream_version: i64,
    pub status: AccountStatus,
    pub plan_id: Option<String>,
    pub period: Option<String>,
    pub used: HashMap<Meter, i64>,
}

/// Upsert the projection row for `stream_id` within an in-flight append
/// transaction, so it never diverges from the event it is derived from.
pub async fn upsert(
    tx: &mut Transaction<'_, Postgres>,
    stream_id: &str,
    stream_version: i64,
    state: &Account,
) -> Result<(), sqlx::Error> {
    let status = state.status().as_str();
    let used: HashMap<String, i64> =
        state.used().iter().map(|(meter, units)| (meter.to_string(), *units)).collect();
    let used_json = serde_json::to_value(&used).expect("plain string/int map always serializes");

    sqlx::query(
        r#"
        INSERT INTO account_current (account_id, stream_version, status, plan_id, period, used)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (account_id) DO UPDATE SET
            stream_version = EXCLUDED.stream_version,
            status = EXCLUDED.status,
            plan_id = EXCLUDED.plan_id,
            period = EXCLUDED.period,
            used = EXCLUDED.used
        "#,
    )
    .bind(stream_id)
    .bind(stream_version)
    .bind(status)
    .bind(state.plan_id())
    .bind(state.period())
    .bind(used_json)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Look up the current projection row for an account, if one exists.
pub async fn get_by_id(pool: &PgPool, account_id: &str) -> Result<Option<ProjectionRow>, sqlx::Error> {
    let row: Option<ProjectionRowDb> = sqlx::query_as(
        r#"
        SELECT account_id, stream_version, status, plan_id, period, used
        FROM account_current
        WHERE account_id = $1
        "#,
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(ProjectionRowDb::into_row))
}

#[derive(sqlx::FromRow)]
struct ProjectionRowDb {
    account_id: String,
    stream_version: i64,
    status: String,
    plan_id: Option<String>,
    period: Option<String>,
    used: serde_json::Value,
}

impl ProjectionRowDb {
    fn into_row(self) -> ProjectionRow {
        let status = match self.status.as_str() {
            "suspended" => AccountStatus::Suspended,
            _ => AccountStatus::Active,
        };
        let raw: HashMap<String, i64> = serde_json::from_value(self.used).unwrap_or_default();
        let used = raw
            .into_iter()
            .filter_map(|(k, v)| Meter::from_str(&k).ok().map(|meter| (meter, v)))
            .collect();

        ProjectionRow {
            account_id: self.account_id,
            stream_version: self.stream_version,
            status,
            plan_id: self.plan_id,
            period: self.period,
            used,
        }
    }
}
