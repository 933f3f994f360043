//! Interval timer service - ties scheduler runs to session records

use std::sync::Arc;

use cadence_domain::{Result, TimerConfig};
use parking_lot::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{error, warn};
use uuid::Uuid;

use super::events::{TimerEvent, TimerEventSink};
use super::scheduler::{PhaseScheduler, RunHandle, RunSummary};
use crate::sync::SyncRepository;

/// Routes cycle counts of the active run to its recorder task.
#[derive(Default)]
struct CycleForwarder {
    route: Mutex<Option<(Uuid, mpsc::UnboundedSender<u32>)>>,
}

impl TimerEventSink for CycleForwarder {
    fn on_event(&self, event: &TimerEvent) {
        if let TimerEvent::CycleCompleted { run_id, completed_cycles } = event {
            if let Some((active, tx)) = self.route.lock().as_ref() {
                if active == run_id {
                    let _ = tx.send(*completed_cycles);
                }
            }
        }
    }
}

struct ActiveSession {
    session_id: i64,
    recorder: JoinHandle<()>,
}

/// Interval timer service
pub struct IntervalTimer {
    scheduler: Arc<PhaseScheduler>,
    repository: Arc<SyncRepository>,
    forwarder: Arc<CycleForwarder>,
    active: AsyncMutex<Option<ActiveSession>>,
}

impl IntervalTimer {
    /// Create a new timer service and subscribe it to `scheduler`.
    pub fn new(scheduler: Arc<PhaseScheduler>, repository: Arc<SyncRepository>) -> Self {
        let forwarder = Arc::new(CycleForwarder::default());
        scheduler.subscribe(forwarder.clone());
        Self { scheduler, repository, forwarder, active: AsyncMutex::new(None) }
    }

    pub fn scheduler(&self) -> &Arc<PhaseScheduler> {
        &self.scheduler
    }

    pub fn repository(&self) -> &Arc<SyncRepository> {
        &self.repository
    }

    /// Start a run and record its session.
    ///
    /// If the session cannot be recorded the run is stopped again and the
    /// storage error returned.
    pub async fn start(&self, config: TimerConfig) -> Result<(RunHandle, i64)> {
        let mut active = self.active.lock().await;
        let handle = self.scheduler.start(config)?;

        let session_id = match self.repository.record_session_start(&config).await {
            Ok(id) => id,
            Err(err) => {
                error!(run_id = %handle.run_id, error = %err, "failed to record session start");
                self.scheduler.stop(false);
                return Err(err);
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        *self.forwarder.route.lock() = Some((handle.run_id, tx));

        let repository = Arc::clone(&self.repository);
        let recorder = tokio::spawn(async move {
            while let Some(cycles) = rx.recv().await {
                if let Err(err) = repository.record_cycles(session_id, cycles).await {
                    warn!(session_id, cycles, error = %err, "failed to record completed cycles");
                }
            }
        });

        *active = Some(ActiveSession { session_id, recorder });
        Ok((handle, session_id))
    }

    /// Stop the active run and close its session. No-op when idle.
    pub async fn stop(&self, manually_ended: bool) -> Result<Option<RunSummary>> {
        let mut active = self.active.lock().await;
        let Some(summary) = self.scheduler.stop(manually_ended) else {
            return Ok(None);
        };

        // Dropping the sender lets the recorder drain and exit.
        self.forwarder.route.lock().take();

        if let Some(session) = active.take() {
            if let Err(err) = session.recorder.await {
                warn!(error = %err, "cycle recorder task failed");
            }
            self.repository.record_cycles(session.session_id, summary.total_cycles).await?;
            self.repository.record_session_end(session.session_id, manually_ended).await?;
        }

        Ok(Some(summary))
    }

    /// Session id of the active run.
    pub async fn current_session(&self) -> Option<i64> {
        self.active.lock().await.as_ref().map(|session| session.session_id)
    }
}
