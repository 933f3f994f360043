#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use cadence_infra::database::DbManager;
use tempfile::TempDir;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

const TEST_DB_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new encrypted temporary database with the full schema.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager =
            DbManager::new(&db_path, 4, Some(TEST_DB_KEY)).expect("db manager should be created");
        manager.run_migrations().expect("schema should be created");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    /// Execute a batch of SQL statements against the database.
    pub fn execute_batch(&self, sql: &str) {
        let conn = self
            .manager
            .get_connection()
            .expect("connection should be available for execute_batch");
        conn.execute_batch(sql).expect("SQL batch execution should succeed");
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for inspecting captured log output during tests.
#[derive(Clone, Default)]
pub struct LogHandle {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogHandle {
    pub fn output(&self) -> String {
        let guard = self.buffer.lock().expect("log mutex poisoned");
        String::from_utf8_lossy(&guard).into_owned()
    }

    pub fn contains(&self, level: &str, needle: &str) -> bool {
        self.output().lines().any(|line| line.contains(level) && line.contains(needle))
    }
}

pub struct LogWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().expect("log mutex poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogHandle {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter { buffer: Arc::clone(&self.buffer) }
    }
}

/// Capture tracing output on the current thread until the guard drops.
///
/// Use with a current-thread runtime so spawned tasks log to the same
/// subscriber.
pub fn capture_logs() -> (LogHandle, DefaultGuard) {
    let handle = LogHandle::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(handle.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (handle, guard)
}
