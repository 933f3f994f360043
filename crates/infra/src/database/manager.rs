//! Database connection manager backed by the SQLite/SQLCipher pool.

use std::path::{Path, PathBuf};

use cadence_domain::{CadenceError, DatabaseConfig, Result};
use rusqlite::params;
use tracing::info;

use super::sqlcipher_pool::{create_pool, PoolConfig, SqliteConnection, SqlitePool};
use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps a [`SqlitePool`].
pub struct DbManager {
    pool: SqlitePool,
    path: PathBuf,
    encrypted: bool,
}

impl DbManager {
    /// Create a new manager with the given pool size and optional SQLCipher key.
    pub fn new<P: AsRef<Path>>(
        db_path: P,
        pool_size: u32,
        encryption_key: Option<&str>,
    ) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let config = PoolConfig { max_size: pool_size.max(1), ..PoolConfig::default() };
        let pool = create_pool(&path, encryption_key.map(ToOwned::to_owned), config)?;

        info!(
            db_path = %path.display(),
            max_connections = pool.max_size(),
            encrypted = encryption_key.is_some(),
            "sqlite pool initialised"
        );

        Ok(Self { pool, path, encrypted: encryption_key.is_some() })
    }

    /// Open the database described by `config` and ensure the schema exists.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    CadenceError::Database(format!(
                        "failed to create database directory {}: {err}",
                        parent.display()
                    ))
                })?;
            }
        }

        let manager = Self::new(&config.path, config.pool_size, config.encryption_key.as_deref())?;
        manager.run_migrations()?;
        Ok(manager)
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        self.pool.get().map_err(|err| InfraError::from(err).into())
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        create_schema(&conn)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Perform a health check to verify database connectivity.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0)).map_err(map_sql_error)?;
        Ok(())
    }
}

fn create_schema(conn: &SqliteConnection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
        params![SCHEMA_VERSION],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub(crate) fn map_sql_error(err: rusqlite::Error) -> CadenceError {
    CadenceError::from(InfraError::from(err))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const TEST_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    #[test]
    fn migrations_create_schema_version() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4, Some(TEST_KEY)).expect("manager created");
        manager.run_migrations().expect("migrations run");
        manager.run_migrations().expect("migrations are idempotent");

        let conn = manager.get_connection().expect("connection acquired");
        let version: i32 =
            conn.query_row("SELECT version FROM schema_version", [], |row| row.get(0)).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn health_check_succeeds_for_plain_database() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("plain.db");

        let manager = DbManager::new(&db_path, 2, None).expect("manager created");
        manager.run_migrations().expect("migrations run");

        assert!(!manager.is_encrypted());
        manager.health_check().expect("health check passed");
    }

    #[test]
    fn open_creates_parent_directory() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let path = temp_dir.path().join("nested/dir/cadence.db");
        let config = DatabaseConfig {
            path: path.to_string_lossy().to_string(),
            pool_size: 2,
            encryption_key: Some(TEST_KEY.to_string()),
        };

        let manager = DbManager::open(&config).expect("database opened");
        assert!(manager.path().exists());
        assert!(manager.is_encrypted());
    }
}
