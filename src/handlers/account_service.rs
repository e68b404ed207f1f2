//! Account service
//!
//! Stateless orchestration over the event store: for every write command,
//! load the stream, fold it, decide, append. Reads prefer the projection
//! and fall back to a full replay.

use sqlx::PgPool;

use crate::aggregate::{self, account::AccountStatus};
use crate::domain::{Command, DomainError};
use crate::error::AppResult;
use crate::event_store::{EventStore, StoredEvent};
use crate::projection;

/// Where an `AccountState` response was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSource {
    Projection,
    Replay,
}

impl StateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateSource::Projection => "projection",
            StateSource::Replay => "replay",
        }
    }
}

/// Current state of an account, as returned to a caller.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub account_id: String,
    pub exists: bool,
    pub status: AccountStatus,
    pub plan_id: Option<String>,
    pub period: Option<String>,
    pub used: std::collections::HashMap<crate::domain::Meter, i64>,
    pub stream_version: i64,
    pub source: StateSource,
}

#[derive(Debug, Clone)]
pub struct AccountService {
    store: EventStore,
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { store: EventStore::new(pool.clone()), pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run one write command through load → fold → decide → append.
    pub async fn execute(&self, command: Command) -> AppResult<i64> {
        let account_id = command.account_id().to_string();
        let history = self.store.load_stream(&account_id).await?;
        let events = history
            .iter()
            .map(StoredEvent::to_event)
            .collect::<Result<Vec<_>, DomainError>>()?;
        let expected_version = events.len() as i64;
        let state = aggregate::fold(events);

        if !matches!(command, Command::CreateAccount(_)) && !state.exists() {
            return Err(DomainError::not_found(&account_id).into());
        }

        let decided = aggregate::decide(&state, command)?;
        Ok(self.store.append(&account_id, expected_version, decided).await?)
    }

    /// Current state of `account_id`: projection first, replay on miss.
    pub async fn get_state(&self, account_id: &str) -> AppResult<AccountState> {
        if let Some(row) = projection::get_by_id(&self.pool, account_id).await? {
            return Ok(AccountState {
                account_id: row.account_id,
                exists: true,
                status: row.status,
                plan_id: row.plan_id,
                period: row.period,
                used: row.used,
                stream_version: row.stream_version,
                source: StateSource::Projection,
            });
        }

        let history = self.store.load_stream(account_id).await?;
        let stream_version = history.len() as i64;
        let events = history
            .iter()
            .map(StoredEvent::to_event)
            .collect::<Result<Vec<_>, DomainError>>()?;
        let state = aggregate::fold(events);

        if !state.exists() {
            return Err(DomainError::not_found(account_id).into());
        }

        Ok(AccountState {
            account_id: account_id.to_string(),
            exists: state.exists(),
            status: state.status(),
            plan_id: state.plan_id().map(str::to_string),
            period: state.period().map(str::to_string),
            used: state.used().clone(),
            stream_version,
            source: StateSource::Replay,
        })
    }

    /// Full upcast event history for a stream. Never raises `NotFound`: an
    /// unknown account simply has an empty history.
    pub async fn list_events(&self, account_id: &str) -> AppResult<Vec<StoredEvent>> {
        Ok(self.store.load_stream(account_id).await?)
    }
}
