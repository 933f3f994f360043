//! SQLite-backed session store.
//!
//! Implements the `SessionStore` port over the `timer_sessions` table. All
//! database operations run in `spawn_blocking` to avoid blocking the async
//! runtime.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::SessionStore;
use cadence_domain::{CadenceError, Result as DomainResult, Session};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use super::map_join_error;
use super::sqlcipher_pool::SqliteConnection;

const SELECT_COLUMNS: &str = "SELECT id, start_time, end_time, activity_minutes, rest_minutes,
        completed_cycles, manually_ended, synced
 FROM timer_sessions";

/// `SessionStore` over the shared SQLite pool.
pub struct SqliteSessionStore {
    db: Arc<DbManager>,
}

impl SqliteSessionStore {
    /// Create a new store with the given database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    async fn run<T, F>(&self, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteConnection) -> DomainResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<T> {
            let conn = db.get_connection()?;
            op(&conn)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn insert(&self, session: &Session) -> DomainResult<i64> {
        let session = session.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO timer_sessions
                    (start_time, end_time, activity_minutes, rest_minutes,
                     completed_cycles, manually_ended, synced)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session.start_time.timestamp_millis(),
                    session.end_time.map(|t| t.timestamp_millis()),
                    session.activity_minutes,
                    session.rest_minutes,
                    session.completed_cycles,
                    session.manually_ended,
                    session.synced,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn update(&self, session: &Session) -> DomainResult<()> {
        let session = session.clone();
        let id = session
            .id
            .ok_or_else(|| CadenceError::NotFound("cannot update a session without id".into()))?;

        self.run(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE timer_sessions
                     SET start_time = ?2, end_time = ?3, activity_minutes = ?4, rest_minutes = ?5,
                         completed_cycles = ?6, manually_ended = ?7, synced = ?8
                     WHERE id = ?1",
                    params![
                        id,
                        session.start_time.timestamp_millis(),
                        session.end_time.map(|t| t.timestamp_millis()),
                        session.activity_minutes,
                        session.rest_minutes,
                        session.completed_cycles,
                        session.manually_ended,
                        session.synced,
                    ],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(CadenceError::NotFound(format!("session {id}")));
            }
            Ok(())
        })
        .await
    }

    async fn get_by_id(&self, id: i64) -> DomainResult<Option<Session>> {
        self.run(move |conn| {
            conn.query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), params![id], map_session_row)
                .optional()
                .map_err(map_sql_error)
        })
        .await
    }

    async fn list_recent(&self, limit: usize) -> DomainResult<Vec<Session>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run(move |conn| query_sessions(conn, Some(limit))).await
    }

    async fn list_all(&self) -> DomainResult<Vec<Session>> {
        self.run(|conn| query_sessions(conn, None)).await
    }

    async fn count_completed(&self) -> DomainResult<u64> {
        self.run(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM timer_sessions WHERE end_time IS NOT NULL",
                    [],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
    }

    async fn sum_cycles(&self) -> DomainResult<u64> {
        self.run(|conn| {
            let total: i64 = conn
                .query_row(
                    "SELECT COALESCE(SUM(completed_cycles), 0) FROM timer_sessions",
                    [],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            Ok(u64::try_from(total).unwrap_or_default())
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_sessions(conn: &SqliteConnection, limit: Option<i64>) -> DomainResult<Vec<Session>> {
    let sql = format!("{SELECT_COLUMNS} ORDER BY start_time DESC, id DESC LIMIT ?1");
    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![limit.unwrap_or(-1)], map_session_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;
    Ok(rows)
}

fn map_session_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: Some(row.get(0)?),
        start_time: millis_to_datetime(row.get(1)?, 1)?,
        end_time: row
            .get::<_, Option<i64>>(2)?
            .map(|ms| millis_to_datetime(ms, 2))
            .transpose()?,
        activity_minutes: row.get(3)?,
        rest_minutes: row.get(4)?,
        completed_cycles: row.get(5)?,
        manually_ended: row.get(6)?,
        synced: row.get(7)?,
    })
}

fn millis_to_datetime(ms: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(column, ms)
    })
}

// ============================================================================
// Tests
// ============================================================================
