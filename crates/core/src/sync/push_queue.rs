//! Background push queue keyed by session id
//!
//! At most one push per session is in flight. Requests that arrive while a
//! push for the same id is running collapse into a single follow-up push,
//! which reloads the latest stored state before sending it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cadence_domain::{CadenceError, PushReceipt, Result, Session};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch, Mutex as AsyncMutex};
use tracing::{debug, warn};

use super::ports::{RemoteSyncClient, SessionStore};

const OUTCOME_CHANNEL_CAPACITY: usize = 64;

/// Result of one background push, published for diagnostics.
#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub session_id: i64,
    pub result: Result<PushReceipt>,
}

impl PushOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Dependencies shared between the repository and the push workers.
pub(crate) struct SyncShared {
    pub store: Arc<dyn SessionStore>,
    pub remote: Arc<dyn RemoteSyncClient>,
    /// Orders every local mutation, including the `synced` mark after a push.
    pub write_gate: AsyncMutex<()>,
}

impl SyncShared {
    /// Mark each snapshot as synced if the stored row still has the content
    /// that was sent.
    pub async fn mark_synced_if_unchanged(&self, sent: &[Session]) -> Result<usize> {
        let _gate = self.write_gate.lock().await;
        let mut marked = 0;
        for snapshot in sent {
            let Some(id) = snapshot.id else { continue };
            let Some(mut current) = self.store.get_by_id(id).await? else { continue };
            if current.synced || !current.same_content(snapshot) {
                continue;
            }
            current.synced = true;
            self.store.update(&current).await?;
            marked += 1;
        }
        Ok(marked)
    }
}

#[derive(Debug, Default)]
struct WorkerSlot {
    follow_up: bool,
}

/// Live worker slots plus a watch of their count, updated under the same lock.
#[derive(Debug)]
struct Workers {
    slots: Mutex<HashMap<i64, WorkerSlot>>,
    pending: watch::Sender<usize>,
}

/// Fire-and-forget push scheduler.
pub struct PushQueue {
    shared: Arc<SyncShared>,
    workers: Arc<Workers>,
    outcomes: broadcast::Sender<PushOutcome>,
}

impl PushQueue {
    pub(crate) fn new(shared: Arc<SyncShared>) -> Self {
        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);
        let (pending, _) = watch::channel(0);
        let workers = Arc::new(Workers { slots: Mutex::new(HashMap::new()), pending });
        Self { shared, workers, outcomes }
    }

    /// Request a push of the latest stored state of `session_id`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, session_id: i64) {
        {
            let mut slots = self.workers.slots.lock();
            if let Some(slot) = slots.get_mut(&session_id) {
                slot.follow_up = true;
                debug!(session_id, "push already queued, coalescing");
                return;
            }
            slots.insert(session_id, WorkerSlot::default());
            self.workers.pending.send_replace(slots.len());
        }

        let shared = Arc::clone(&self.shared);
        let workers = Arc::clone(&self.workers);
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            loop {
                let result = push_once(&shared, session_id).await;
                match &result {
                    Ok(receipt) => {
                        debug!(session_id, accepted = receipt.accepted_count, "background push done");
                    }
                    Err(err) => warn!(session_id, error = %err, "background push failed"),
                }
                // No receivers is fine.
                let _ = outcomes.send(PushOutcome { session_id, result });

                if !take_follow_up(&workers, session_id) {
                    break;
                }
            }
        });
    }

    /// Subscribe to push results.
    pub fn subscribe(&self) -> broadcast::Receiver<PushOutcome> {
        self.outcomes.subscribe()
    }

    /// Number of sessions with a push queued or running.
    pub fn pending(&self) -> usize {
        self.workers.slots.lock().len()
    }

    /// Wait up to `timeout` for every queued push to finish. Returns the
    /// number still pending when the wait ends.
    pub async fn drain(&self, timeout: Duration) -> usize {
        let mut pending = self.workers.pending.subscribe();
        let drained = matches!(
            tokio::time::timeout(timeout, pending.wait_for(|count| *count == 0)).await,
            Ok(Ok(_))
        );
        let remaining = self.pending();
        if !drained {
            warn!(remaining, ?timeout, "background pushes still running");
        }
        remaining
    }
}

/// Consume a pending follow-up, or retire the worker slot when there is none.
fn take_follow_up(workers: &Workers, session_id: i64) -> bool {
    let mut slots = workers.slots.lock();
    match slots.get_mut(&session_id) {
        Some(slot) if slot.follow_up => {
            slot.follow_up = false;
            true
        }
        _ => {
            slots.remove(&session_id);
            workers.pending.send_replace(slots.len());
            false
        }
    }
}

async fn push_once(shared: &SyncShared, session_id: i64) -> Result<PushReceipt> {
    let snapshot = shared
        .store
        .get_by_id(session_id)
        .await?
        .ok_or_else(|| CadenceError::NotFound(format!("session {session_id}")))?;

    let receipt = shared.remote.push_sessions(&[snapshot.envelope()]).await?;
    shared.mark_synced_if_unchanged(std::slice::from_ref(&snapshot)).await?;
    Ok(receipt)
}
