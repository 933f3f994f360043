//! SQLite-backed settings repository.
//!
//! Implements the `SettingsPort` trait as a small key/value table with upsert
//! semantics. Missing keys fall back to [`RemoteSettings::default`].

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::{RemoteSettings, SettingsPort};
use cadence_domain::constants::{SETTING_API_BASE_URL, SETTING_SYNC_ENABLED, SETTING_USE_STUB_API};
use cadence_domain::{CadenceError, Result as DomainResult};
use rusqlite::{params, OptionalExtension};
use tokio::task;
use tracing::debug;

use super::manager::{map_sql_error, DbManager};
use super::map_join_error;
use super::sqlcipher_pool::SqliteConnection;

/// Settings stored in the `app_settings` table.
pub struct SqliteSettingsRepository {
    db: Arc<DbManager>,
}

impl SqliteSettingsRepository {
    /// Create a new repository with the given database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    async fn get_value(&self, key: &'static str) -> DomainResult<Option<String>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<Option<String>> {
            let conn = db.get_connection()?;
            query_value(&conn, key)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_value(&self, key: &'static str, value: String) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            upsert_value(&conn, key, &value)
        })
        .await
        .map_err(map_join_error)??;
        debug!(key, "setting updated");
        Ok(())
    }

    async fn get_bool(&self, key: &'static str, default: bool) -> DomainResult<bool> {
        match self.get_value(key).await? {
            Some(raw) => parse_bool(key, &raw),
            None => Ok(default),
        }
    }
}

#[async_trait]
impl SettingsPort for SqliteSettingsRepository {
    async fn sync_enabled(&self) -> DomainResult<bool> {
        self.get_bool(SETTING_SYNC_ENABLED, RemoteSettings::default().sync_enabled).await
    }

    async fn set_sync_enabled(&self, enabled: bool) -> DomainResult<()> {
        self.set_value(SETTING_SYNC_ENABLED, enabled.to_string()).await
    }

    async fn use_stub_api(&self) -> DomainResult<bool> {
        self.get_bool(SETTING_USE_STUB_API, RemoteSettings::default().use_stub).await
    }

    async fn set_use_stub_api(&self, use_stub: bool) -> DomainResult<()> {
        self.set_value(SETTING_USE_STUB_API, use_stub.to_string()).await
    }

    async fn api_base_url(&self) -> DomainResult<String> {
        Ok(self
            .get_value(SETTING_API_BASE_URL)
            .await?
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| RemoteSettings::default().base_url))
    }

    async fn set_api_base_url(&self, url: &str) -> DomainResult<()> {
        let parsed = url::Url::parse(url)
            .map_err(|err| CadenceError::InvalidConfig(format!("api base url {url:?}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CadenceError::InvalidConfig(format!(
                "api base url must use http or https, got {}",
                parsed.scheme()
            )));
        }
        self.set_value(SETTING_API_BASE_URL, url.to_string()).await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_value(conn: &SqliteConnection, key: &str) -> DomainResult<Option<String>> {
    conn.query_row("SELECT value FROM app_settings WHERE key = ?1", params![key], |row| row.get(0))
        .optional()
        .map_err(map_sql_error)
}

fn upsert_value(conn: &SqliteConnection, key: &str, value: &str) -> DomainResult<()> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT INTO app_settings (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at",
        params![key, value, now],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn parse_bool(key: &str, raw: &str) -> DomainResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(CadenceError::Config(format!("setting {key} holds non-boolean value {other:?}"))),
    }
}

// ============================================================================
// Tests
// ============================================================================
