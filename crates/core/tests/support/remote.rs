//! Scriptable remote sync client for testing

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use cadence_core::RemoteSyncClient;
use cadence_domain::{
    AuthSession, CadenceError, Leaderboard, PushReceipt, RemoteStats, Result as DomainResult,
    SyncEnvelope,
};
use parking_lot::Mutex;

/// Remote fake that merges pushes by id and can be told to fail or stall.
#[derive(Default)]
pub struct FakeRemote {
    sessions: Mutex<BTreeMap<i64, SyncEnvelope>>,
    pushes: Mutex<Vec<Vec<SyncEnvelope>>>,
    failure: Mutex<Option<CadenceError>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call with `error` until cleared.
    pub fn fail_with(&self, error: Option<CadenceError>) {
        *self.failure.lock() = error;
    }

    /// Sleep before answering each call.
    pub fn delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    pub fn push_count(&self) -> usize {
        self.pushes.lock().len()
    }

    pub fn pushes(&self) -> Vec<Vec<SyncEnvelope>> {
        self.pushes.lock().clone()
    }

    pub fn stored(&self, id: i64) -> Option<SyncEnvelope> {
        self.sessions.lock().get(&id).cloned()
    }

    async fn gate(&self) -> DomainResult<()> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteSyncClient for FakeRemote {
    async fn login(&self, email: &str, _password: &str) -> DomainResult<AuthSession> {
        self.gate().await?;
        Ok(AuthSession { token: "fake".into(), user_id: "fake_user".into(), email: email.into() })
    }

    async fn register(&self, email: &str, password: &str, _name: &str) -> DomainResult<AuthSession> {
        self.login(email, password).await
    }

    async fn logout(&self) -> DomainResult<()> {
        self.gate().await
    }

    async fn push_sessions(&self, batch: &[SyncEnvelope]) -> DomainResult<PushReceipt> {
        self.gate().await?;
        self.pushes.lock().push(batch.to_vec());
        let mut sessions = self.sessions.lock();
        let mut accepted = 0;
        for envelope in batch {
            let Some(id) = envelope.id else { continue };
            if sessions.contains_key(&id) {
                continue;
            }
            sessions.insert(id, envelope.clone());
            accepted += 1;
        }
        Ok(PushReceipt { accepted_count: accepted, message: None })
    }

    async fn fetch_sessions(&self) -> DomainResult<Vec<SyncEnvelope>> {
        self.gate().await?;
        let mut all: Vec<_> = self.sessions.lock().values().cloned().collect();
        all.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(all)
    }

    async fn fetch_stats(&self) -> DomainResult<RemoteStats> {
        self.gate().await?;
        let sessions = self.sessions.lock();
        Ok(RemoteStats {
            user_id: "fake_user".into(),
            total_sessions: sessions.len() as u32,
            total_cycles: sessions.values().map(|s| s.completed_cycles).sum(),
            total_activity_minutes: 0,
            total_rest_minutes: 0,
            average_session_minutes: 0.0,
            last_session_at: None,
            streak_days: 0,
        })
    }

    async fn fetch_leaderboard(&self, _limit: usize) -> DomainResult<Leaderboard> {
        self.gate().await?;
        Ok(Leaderboard { entries: Vec::new(), user_rank: None })
    }

    async fn ping(&self) -> DomainResult<bool> {
        Ok(self.gate().await.is_ok())
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}
