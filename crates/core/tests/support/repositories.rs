//! In-memory session store for testing

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cadence_core::SessionStore;
use cadence_domain::{CadenceError, Result as DomainResult, Session};
use parking_lot::Mutex;

/// `SessionStore` backed by a map, with an optional write failure switch.
#[derive(Default)]
pub struct MemorySessionStore {
    rows: Mutex<BTreeMap<i64, Session>>,
    next_id: Mutex<i64>,
    fail_writes: AtomicBool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert/update fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self, id: i64) -> Option<Session> {
        self.rows.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    fn check_writable(&self) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CadenceError::Database("disk full".into()));
        }
        Ok(())
    }

    fn sorted_desc(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.rows.lock().values().cloned().collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        sessions
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: &Session) -> DomainResult<i64> {
        self.check_writable()?;
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        let mut stored = session.clone();
        stored.id = Some(id);
        self.rows.lock().insert(id, stored);
        Ok(id)
    }

    async fn update(&self, session: &Session) -> DomainResult<()> {
        self.check_writable()?;
        let id = session.id.ok_or_else(|| CadenceError::NotFound("session without id".into()))?;
        let mut rows = self.rows.lock();
        let row = rows.get_mut(&id).ok_or_else(|| CadenceError::NotFound(format!("session {id}")))?;
        *row = session.clone();
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> DomainResult<Option<Session>> {
        Ok(self.snapshot(id))
    }

    async fn list_recent(&self, limit: usize) -> DomainResult<Vec<Session>> {
        Ok(self.sorted_desc().into_iter().take(limit).collect())
    }

    async fn list_all(&self) -> DomainResult<Vec<Session>> {
        Ok(self.sorted_desc())
    }

    async fn count_completed(&self) -> DomainResult<u64> {
        Ok(self.rows.lock().values().filter(|s| s.end_time.is_some()).count() as u64)
    }

    async fn sum_cycles(&self) -> DomainResult<u64> {
        Ok(self.rows.lock().values().map(|s| u64::from(s.completed_cycles)).sum())
    }
}
