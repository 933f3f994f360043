//! Local-first session repository
//!
//! Every session write lands in the [`SessionStore`] first and returns as soon
//! as that write completes. When sync is enabled a background push follows;
//! its failure never touches local state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cadence_domain::constants::DEFAULT_SYNC_TIMEOUT_SECS;
use cadence_domain::{
    now_millis, CadenceError, CombinedStats, RemoteStats, Result, Session, SyncEnvelope,
    TimerConfig,
};
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tracing::{debug, info, instrument, warn};

use super::ports::{RemoteSyncClient, SessionStore};
use super::push_queue::{PushOutcome, PushQueue, SyncShared};

/// Mediates every session read and write between local storage and the
/// remote sync client.
pub struct SyncRepository {
    shared: Arc<SyncShared>,
    push_queue: PushQueue,
    sync_enabled: AtomicBool,
    remote_timeout: Duration,
}

impl SyncRepository {
    /// Create a repository with the initial sync setting.
    pub fn new(
        store: Arc<dyn SessionStore>,
        remote: Arc<dyn RemoteSyncClient>,
        sync_enabled: bool,
    ) -> Self {
        let shared = Arc::new(SyncShared { store, remote, write_gate: AsyncMutex::new(()) });
        Self {
            push_queue: PushQueue::new(Arc::clone(&shared)),
            shared,
            sync_enabled: AtomicBool::new(sync_enabled),
            remote_timeout: Duration::from_secs(DEFAULT_SYNC_TIMEOUT_SECS),
        }
    }

    /// Bound applied to `sync_all` and remote stats reads.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn is_sync_enabled(&self) -> bool {
        self.sync_enabled.load(Ordering::SeqCst)
    }

    pub fn set_sync_enabled(&self, enabled: bool) {
        let previous = self.sync_enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            info!(enabled, "sync setting changed");
        }
    }

    /// The remote client this repository pushes to.
    pub fn remote(&self) -> &Arc<dyn RemoteSyncClient> {
        &self.shared.remote
    }

    /// Persist a new open session for `config` and return its id.
    #[instrument(skip(self))]
    pub async fn record_session_start(&self, config: &TimerConfig) -> Result<i64> {
        config.validate()?;

        let id = {
            let _gate = self.shared.write_gate.lock().await;
            self.shared.store.insert(&Session::start(config)).await?
        };

        debug!(session_id = id, "session recorded");
        self.push_in_background(id);
        Ok(id)
    }

    /// Close a session. A second end request for the same session is a no-op.
    ///
    /// # Errors
    /// `NotFound` if the session does not exist.
    #[instrument(skip(self))]
    pub async fn record_session_end(&self, session_id: i64, manually_ended: bool) -> Result<()> {
        {
            let _gate = self.shared.write_gate.lock().await;
            let mut session = self.load(session_id).await?;
            if session.is_completed() {
                debug!(session_id, "session already ended");
                return Ok(());
            }
            session.end_time = Some(now_millis());
            session.manually_ended = manually_ended;
            session.synced = false;
            self.shared.store.update(&session).await?;
        }

        self.push_in_background(session_id);
        Ok(())
    }

    /// Raise the stored cycle count. Lower values are ignored so the count
    /// never decreases.
    pub async fn record_cycles(&self, session_id: i64, completed_cycles: u32) -> Result<()> {
        {
            let _gate = self.shared.write_gate.lock().await;
            let mut session = self.load(session_id).await?;
            if completed_cycles <= session.completed_cycles {
                return Ok(());
            }
            session.completed_cycles = completed_cycles;
            session.synced = false;
            self.shared.store.update(&session).await?;
        }

        self.push_in_background(session_id);
        Ok(())
    }

    /// Push every local session in one batch and return the remote's
    /// `accepted_count`.
    ///
    /// # Errors
    /// `SyncDisabled` when sync is off; `NetworkUnavailable` on timeout; any
    /// remote error is propagated.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> Result<u32> {
        if !self.is_sync_enabled() {
            return Err(CadenceError::SyncDisabled);
        }

        let sessions = self.shared.store.list_all().await?;
        let batch: Vec<SyncEnvelope> = sessions.iter().map(SyncEnvelope::from).collect();

        let receipt = tokio::time::timeout(self.remote_timeout, self.shared.remote.push_sessions(&batch))
            .await
            .map_err(|_| self.timed_out("session sync"))??;

        let marked = self.shared.mark_synced_if_unchanged(&sessions).await?;
        info!(
            submitted = batch.len(),
            accepted = receipt.accepted_count,
            marked_synced = marked,
            "sync completed"
        );
        Ok(receipt.accepted_count)
    }

    /// Local counters, plus remote stats when sync is on and the fetch
    /// succeeds in time. Remote failures degrade to local-only.
    pub async fn combined_stats(&self) -> Result<CombinedStats> {
        let local_sessions = self.shared.store.count_completed().await?;
        let local_cycles = self.shared.store.sum_cycles().await?;

        let remote = if self.is_sync_enabled() {
            match self.fetch_remote_stats().await {
                Ok(stats) => Some(stats),
                Err(err) => {
                    warn!(error = %err, "remote stats unavailable, using local stats only");
                    None
                }
            }
        } else {
            None
        };

        Ok(CombinedStats { local_sessions, local_cycles, remote })
    }

    /// Explicit remote stats read.
    ///
    /// # Errors
    /// `SyncDisabled` when sync is off; remote errors and timeouts propagate.
    pub async fn fetch_remote_stats(&self) -> Result<RemoteStats> {
        if !self.is_sync_enabled() {
            return Err(CadenceError::SyncDisabled);
        }
        tokio::time::timeout(self.remote_timeout, self.shared.remote.fetch_stats())
            .await
            .map_err(|_| self.timed_out("stats fetch"))?
    }

    pub async fn recent_sessions(&self, limit: usize) -> Result<Vec<Session>> {
        self.shared.store.list_recent(limit).await
    }

    pub async fn session(&self, session_id: i64) -> Result<Option<Session>> {
        self.shared.store.get_by_id(session_id).await
    }

    /// Subscribe to background push results.
    pub fn push_outcomes(&self) -> broadcast::Receiver<PushOutcome> {
        self.push_queue.subscribe()
    }

    /// Sessions with a background push queued or running.
    pub fn pending_pushes(&self) -> usize {
        self.push_queue.pending()
    }

    /// Give background pushes up to `timeout` to finish. Returns how many
    /// were still running when the wait ended.
    pub async fn drain_pushes(&self, timeout: Duration) -> usize {
        self.push_queue.drain(timeout).await
    }

    async fn load(&self, session_id: i64) -> Result<Session> {
        self.shared
            .store
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(format!("session {session_id}")))
    }

    fn push_in_background(&self, session_id: i64) {
        if self.is_sync_enabled() {
            self.push_queue.enqueue(session_id);
        }
    }

    fn timed_out(&self, what: &str) -> CadenceError {
        CadenceError::NetworkUnavailable(format!(
            "{what} timed out after {}s",
            self.remote_timeout.as_secs_f32()
        ))
    }
}
