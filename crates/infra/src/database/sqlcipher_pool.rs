//! SQLite/SQLCipher connection pool
//!
//! r2d2 pool whose connections are keyed (when a key is configured) and have
//! the per-connection pragmas applied before first use.

use std::path::Path;
use std::time::Duration;

use cadence_domain::{CadenceError, Result as DomainResult};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{instrument, warn};

/// Pool type used by every repository.
pub type SqlitePool = Pool<SqliteConnectionManager>;

/// Connection checked out of [`SqlitePool`].
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// Pool tuning.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_size: u32,
    pub connection_timeout: Duration,
    pub busy_timeout: Duration,
    pub enable_wal: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 4,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            enable_wal: true,
        }
    }
}

/// Build a pool for `path`, applying `encryption_key` with `PRAGMA key` on
/// every new connection.
#[instrument(skip_all, fields(db_path = %path.as_ref().display(), pool_size = config.max_size))]
pub fn create_pool<P: AsRef<Path>>(
    path: P,
    encryption_key: Option<String>,
    config: PoolConfig,
) -> DomainResult<SqlitePool> {
    let init_config = config.clone();
    let manager = SqliteConnectionManager::file(path.as_ref()).with_init(move |conn| {
        if let Some(key) = encryption_key.as_deref() {
            conn.pragma_update(None, "key", key)?;
        }
        apply_connection_pragmas(conn, &init_config)
    });

    Pool::builder()
        .max_size(config.max_size.max(1))
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .map_err(|err| {
            warn!(error = %err, "failed to create connection pool");
            let lower = err.to_string().to_lowercase();
            if lower.contains("not a database") || lower.contains("encrypted") {
                CadenceError::Database("SQLCipher key rejected or database not encrypted".into())
            } else {
                CadenceError::Database(format!("failed to create pool: {err}"))
            }
        })
}

/// WAL journal, NORMAL sync, foreign keys and a busy timeout.
fn apply_connection_pragmas(conn: &Connection, config: &PoolConfig) -> rusqlite::Result<()> {
    let mut pragma_sql = String::new();
    if config.enable_wal {
        pragma_sql.push_str("PRAGMA journal_mode=WAL;\n");
    }
    pragma_sql.push_str("PRAGMA synchronous=NORMAL;\n");
    pragma_sql.push_str("PRAGMA foreign_keys=ON;\n");
    conn.execute_batch(&pragma_sql)?;
    conn.busy_timeout(config.busy_timeout)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn pool_applies_wal_and_key() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("pool.db");

        let pool = create_pool(&db_path, Some("pool-test-key".into()), PoolConfig::default())
            .expect("pool should be created");
        let conn = pool.get().expect("connection should be acquired");

        let journal_mode: String =
            conn.pragma_query_value(None, "journal_mode", |row| row.get(0)).unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
        conn.execute("CREATE TABLE scratch (id INTEGER PRIMARY KEY)", []).unwrap();
    }

    #[test]
    fn wrong_key_cannot_read_encrypted_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("enc.db");

        {
            let pool = create_pool(&db_path, Some("right".into()), PoolConfig::default()).unwrap();
            let conn = pool.get().unwrap();
            conn.execute("CREATE TABLE secret (id INTEGER PRIMARY KEY)", []).unwrap();
        }

        let quick = PoolConfig { connection_timeout: Duration::from_millis(500), ..PoolConfig::default() };
        let result = create_pool(&db_path, Some("wrong".into()), quick)
            .and_then(|pool| pool.get().map_err(|e| CadenceError::Database(e.to_string())))
            .and_then(|conn| {
                conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
                    .map_err(|e| CadenceError::Database(e.to_string()))
            });
        assert!(result.is_err());
    }
}
