//! Scheduler events and the sinks that observe them

use cadence_domain::Phase;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Emitted by the scheduler in transition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerEvent {
    PhaseChanged { run_id: Uuid, phase: Phase, remaining_seconds: u64 },
    CycleCompleted { run_id: Uuid, completed_cycles: u32 },
    RunEnded { run_id: Uuid, total_cycles: u32, manually_ended: bool },
}

impl TimerEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            Self::PhaseChanged { run_id, .. }
            | Self::CycleCompleted { run_id, .. }
            | Self::RunEnded { run_id, .. } => *run_id,
        }
    }
}

/// Observer of scheduler transitions.
///
/// Called while the scheduler holds its transition lock; implementations must
/// return quickly and must not call back into the scheduler.
pub trait TimerEventSink: Send + Sync {
    fn on_event(&self, event: &TimerEvent);
}

/// Forwards every event into an unbounded channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TimerEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TimerEventSink for ChannelSink {
    fn on_event(&self, event: &TimerEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.tx.send(event.clone());
    }
}

/// Writes events to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl TimerEventSink for LoggingSink {
    fn on_event(&self, event: &TimerEvent) {
        match event {
            TimerEvent::PhaseChanged { run_id, phase, remaining_seconds } => {
                info!(%run_id, %phase, remaining_seconds, "timer phase changed");
            }
            TimerEvent::CycleCompleted { run_id, completed_cycles } => {
                info!(%run_id, completed_cycles, "timer cycle completed");
            }
            TimerEvent::RunEnded { run_id, total_cycles, manually_ended } => {
                info!(%run_id, total_cycles, manually_ended, "timer run ended");
            }
        }
    }
}
