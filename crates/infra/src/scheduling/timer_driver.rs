//! Tokio tick source for [`PhaseScheduler`].
//!
//! The scheduler itself is clock-free; the driver advances it by one second
//! per interval period. The loop ends when cancelled or when the scheduler
//! returns to Idle (the run was stopped elsewhere).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cadence_core::PhaseScheduler;
//! use cadence_infra::scheduling::{TimerDriver, TimerDriverConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = Arc::new(PhaseScheduler::new());
//! let driver = TimerDriver::new(scheduler, TimerDriverConfig::default());
//! driver.start().await?;
//! // ... run ...
//! driver.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use cadence_core::PhaseScheduler;
use cadence_domain::constants::DEFAULT_TICK_INTERVAL_MS;
use cadence_domain::Phase;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::error::{SchedulerError, SchedulerResult};

type TaskHandle = Mutex<Option<JoinHandle<()>>>;

#[derive(Debug, Clone)]
pub struct TimerDriverConfig {
    /// Wall-clock time per scheduler second.
    pub tick_interval: Duration,
    /// Bound on waiting for the tick task during `stop`.
    pub join_timeout: Duration,
}

impl Default for TimerDriverConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Drives a [`PhaseScheduler`] from a tokio interval.
pub struct TimerDriver {
    scheduler: Arc<PhaseScheduler>,
    config: TimerDriverConfig,
    cancellation_token: SyncMutex<CancellationToken>,
    task_handle: TaskHandle,
}

impl TimerDriver {
    pub fn new(scheduler: Arc<PhaseScheduler>, config: TimerDriverConfig) -> Self {
        Self {
            scheduler,
            config,
            cancellation_token: SyncMutex::new(CancellationToken::new()),
            task_handle: Mutex::new(None),
        }
    }

    /// Spawn the tick task.
    ///
    /// # Errors
    ///
    /// `AlreadyRunning` if a tick task is still alive.
    #[instrument(skip(self), fields(tick_ms = self.config.tick_interval.as_millis() as u64))]
    pub async fn start(&self) -> SchedulerResult<()> {
        let mut handle = self.task_handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(SchedulerError::AlreadyRunning);
        }

        // Fresh token so the driver can be restarted after stop.
        let cancel = CancellationToken::new();
        *self.cancellation_token.lock() = cancel.clone();

        let scheduler = Arc::clone(&self.scheduler);
        let period = self.config.tick_interval.max(Duration::from_millis(1));
        *handle = Some(tokio::spawn(tick_loop(scheduler, period, cancel)));

        info!("Timer driver started");
        Ok(())
    }

    /// Cancel the tick task and wait for it to finish.
    ///
    /// # Errors
    ///
    /// `NotRunning` if no task was started or it already finished;
    /// `Timeout` if the task does not exit within the join timeout.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> SchedulerResult<()> {
        let handle = {
            let mut guard = self.task_handle.lock().await;
            match guard.take() {
                Some(handle) if !handle.is_finished() => handle,
                _ => return Err(SchedulerError::NotRunning),
            }
        };

        self.cancellation_token.lock().cancel();

        let duration = self.config.join_timeout;
        tokio::time::timeout(duration, handle)
            .await
            .map_err(|_| SchedulerError::Timeout { duration })??;

        info!("Timer driver stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.cancellation_token.lock().cancel();
    }
}

async fn tick_loop(scheduler: Arc<PhaseScheduler>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Tick loop cancelled");
                break;
            }
            _ = interval.tick() => {
                if scheduler.tick().phase == Phase::Idle {
                    debug!("Scheduler idle; tick loop exiting");
                    break;
                }
            }
        }
    }
}
