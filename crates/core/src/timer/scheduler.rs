//! Activity/rest phase state machine
//!
//! The scheduler owns no clock. Something else (the tokio driver in
//! `cadence-infra`, or a test) calls [`PhaseScheduler::tick`] once per second
//! while a run is active. Every transition runs under one lock and events are
//! delivered to sinks before the lock is released, so observers always see
//! them in transition order.

use std::sync::Arc;

use cadence_domain::{now_millis, CadenceError, Phase, Result, TimerConfig};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::events::{TimerEvent, TimerEventSink};

/// Identifies one run; correlates 1:1 with a session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunHandle {
    pub run_id: Uuid,
    pub config: TimerConfig,
    pub started_at: DateTime<Utc>,
}

/// Returned by the stop that ends a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub config: TimerConfig,
    pub total_cycles: u32,
    pub manually_ended: bool,
}

/// Read-only view of the scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerSnapshot {
    pub run_id: Option<Uuid>,
    pub phase: Phase,
    pub remaining_seconds: u64,
    pub completed_cycles: u32,
}

#[derive(Debug)]
struct ActiveRun {
    handle: RunHandle,
    phase: Phase,
    remaining_seconds: u64,
    completed_cycles: u32,
}

impl ActiveRun {
    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            run_id: Some(self.handle.run_id),
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            completed_cycles: self.completed_cycles,
        }
    }
}

/// Phase-driven countdown scheduler.
#[derive(Default)]
pub struct PhaseScheduler {
    run: Mutex<Option<ActiveRun>>,
    sinks: RwLock<Vec<Arc<dyn TimerEventSink>>>,
}

impl PhaseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for all subsequent events.
    pub fn subscribe(&self, sink: Arc<dyn TimerEventSink>) {
        self.sinks.write().push(sink);
    }

    /// Begin a run in the Activity phase.
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration is out of bounds or a run is
    /// already active.
    pub fn start(&self, config: TimerConfig) -> Result<RunHandle> {
        config.validate()?;

        let mut run = self.run.lock();
        if let Some(active) = run.as_ref() {
            return Err(CadenceError::InvalidConfig(format!(
                "a timer run is already active ({})",
                active.handle.run_id
            )));
        }

        let handle = RunHandle { run_id: Uuid::now_v7(), config, started_at: now_millis() };
        let remaining_seconds = config.activity_seconds();
        *run = Some(ActiveRun {
            handle,
            phase: Phase::Activity,
            remaining_seconds,
            completed_cycles: 0,
        });

        debug!(run_id = %handle.run_id, ?config, "timer run started");
        self.emit(&TimerEvent::PhaseChanged {
            run_id: handle.run_id,
            phase: Phase::Activity,
            remaining_seconds,
        });

        Ok(handle)
    }

    /// Advance the countdown by one second. No-op while idle.
    pub fn tick(&self) -> TimerSnapshot {
        let mut guard = self.run.lock();
        let Some(run) = guard.as_mut() else {
            return TimerSnapshot::default();
        };

        run.remaining_seconds = run.remaining_seconds.saturating_sub(1);
        if run.remaining_seconds > 0 {
            return run.snapshot();
        }

        let run_id = run.handle.run_id;
        match run.phase {
            Phase::Activity => {
                run.phase = Phase::Rest;
                run.remaining_seconds = run.handle.config.rest_seconds();
                self.emit(&TimerEvent::PhaseChanged {
                    run_id,
                    phase: Phase::Rest,
                    remaining_seconds: run.remaining_seconds,
                });
            }
            Phase::Rest => {
                run.phase = Phase::Activity;
                run.remaining_seconds = run.handle.config.activity_seconds();
                run.completed_cycles += 1;
                self.emit(&TimerEvent::PhaseChanged {
                    run_id,
                    phase: Phase::Activity,
                    remaining_seconds: run.remaining_seconds,
                });
                self.emit(&TimerEvent::CycleCompleted {
                    run_id,
                    completed_cycles: run.completed_cycles,
                });
            }
            Phase::Idle => {}
        }

        run.snapshot()
    }

    /// End the active run. Returns `None` (and emits nothing) when idle.
    pub fn stop(&self, manually_ended: bool) -> Option<RunSummary> {
        let mut guard = self.run.lock();
        let run = guard.take()?;

        let summary = RunSummary {
            run_id: run.handle.run_id,
            config: run.handle.config,
            total_cycles: run.completed_cycles,
            manually_ended,
        };
        debug!(run_id = %summary.run_id, total_cycles = summary.total_cycles, manually_ended, "timer run stopped");
        self.emit(&TimerEvent::RunEnded {
            run_id: summary.run_id,
            total_cycles: summary.total_cycles,
            manually_ended,
        });

        Some(summary)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.run.lock().as_ref().map(ActiveRun::snapshot).unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().is_some()
    }

    /// Handle of the active run, if any.
    pub fn current_run(&self) -> Option<RunHandle> {
        self.run.lock().as_ref().map(|run| run.handle)
    }

    fn emit(&self, event: &TimerEvent) {
        for sink in self.sinks.read().iter() {
            sink.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<TimerEvent>>,
    }

    impl TimerEventSink for RecordingSink {
        fn on_event(&self, event: &TimerEvent) {
            self.events.lock().push(event.clone());
        }
    }

    fn scheduler_with_sink() -> (PhaseScheduler, Arc<RecordingSink>) {
        let scheduler = PhaseScheduler::new();
        let sink = Arc::new(RecordingSink::default());
        scheduler.subscribe(sink.clone());
        (scheduler, sink)
    }

    fn tick_n(scheduler: &PhaseScheduler, n: u64) -> TimerSnapshot {
        let mut last = scheduler.snapshot();
        for _ in 0..n {
            last = scheduler.tick();
        }
        last
    }

    #[test]
    fn start_enters_activity_with_full_countdown() {
        let (scheduler, sink) = scheduler_with_sink();
        let handle = scheduler.start(TimerConfig::new(25, 5).unwrap()).unwrap();

        let snapshot = scheduler.snapshot();
        assert_eq!(snapshot.phase, Phase::Activity);
        assert_eq!(snapshot.remaining_seconds, 1500);
        assert_eq!(snapshot.run_id, Some(handle.run_id));
        assert_eq!(
            sink.events.lock().as_slice(),
            &[TimerEvent::PhaseChanged {
                run_id: handle.run_id,
                phase: Phase::Activity,
                remaining_seconds: 1500
            }]
        );
    }

    #[test]
    fn rejects_invalid_config() {
        let scheduler = PhaseScheduler::new();
        let err = scheduler.start(TimerConfig { activity_minutes: 5, rest_minutes: 5 }).unwrap_err();
        assert!(matches!(err, CadenceError::InvalidConfig(_)));
        assert!(!scheduler.is_running());
    }

    #[test]
    fn rejects_second_start_while_running() {
        let scheduler = PhaseScheduler::new();
        scheduler.start(TimerConfig::default()).unwrap();
        let err = scheduler.start(TimerConfig::default()).unwrap_err();
        assert!(matches!(err, CadenceError::InvalidConfig(_)));
    }

    #[test]
    fn tick_while_idle_is_noop() {
        let (scheduler, sink) = scheduler_with_sink();
        let snapshot = scheduler.tick();
        assert_eq!(snapshot, TimerSnapshot::default());
        assert!(sink.events.lock().is_empty());
    }

    #[test]
    fn activity_then_rest_then_one_cycle() {
        let scheduler = PhaseScheduler::new();
        scheduler.start(TimerConfig::new(25, 5).unwrap()).unwrap();

        let after_activity = tick_n(&scheduler, 1500);
        assert_eq!(after_activity.phase, Phase::Rest);
        assert_eq!(after_activity.completed_cycles, 0);
        assert_eq!(after_activity.remaining_seconds, 300);

        let after_rest = tick_n(&scheduler, 300);
        assert_eq!(after_rest.phase, Phase::Activity);
        assert_eq!(after_rest.completed_cycles, 1);
        assert_eq!(after_rest.remaining_seconds, 1500);
    }

    #[test]
    fn one_activity_to_rest_switch_per_activity_window() {
        for config in [TimerConfig::new(10, 5).unwrap(), TimerConfig::new(120, 180).unwrap()] {
            let (scheduler, sink) = scheduler_with_sink();
            scheduler.start(config).unwrap();

            tick_n(&scheduler, config.activity_seconds() - 1);
            assert_eq!(scheduler.snapshot().phase, Phase::Activity);
            tick_n(&scheduler, 1);
            assert_eq!(scheduler.snapshot().phase, Phase::Rest);

            let rest_switches = sink
                .events
                .lock()
                .iter()
                .filter(|e| matches!(e, TimerEvent::PhaseChanged { phase: Phase::Rest, .. }))
                .count();
            assert_eq!(rest_switches, 1);
        }
    }

    #[test]
    fn cycles_count_complete_pairs() {
        let (scheduler, sink) = scheduler_with_sink();
        let config = TimerConfig::new(10, 5).unwrap();
        let handle = scheduler.start(config).unwrap();

        let pair = config.activity_seconds() + config.rest_seconds();
        let snapshot = tick_n(&scheduler, pair * 3);
        assert_eq!(snapshot.completed_cycles, 3);

        let cycles: Vec<_> = sink
            .events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TimerEvent::CycleCompleted { completed_cycles, run_id } => {
                    assert_eq!(*run_id, handle.run_id);
                    Some(*completed_cycles)
                }
                _ => None,
            })
            .collect();
        assert_eq!(cycles, vec![1, 2, 3]);
    }

    #[test]
    fn stop_is_idempotent() {
        let (scheduler, sink) = scheduler_with_sink();
        scheduler.start(TimerConfig::default()).unwrap();
        tick_n(&scheduler, 10);

        let first = scheduler.stop(true);
        let second = scheduler.stop(true);

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(scheduler.snapshot().phase, Phase::Idle);
        let ended = sink
            .events
            .lock()
            .iter()
            .filter(|e| matches!(e, TimerEvent::RunEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn stop_reports_cycles_and_allows_restart() {
        let scheduler = PhaseScheduler::new();
        let config = TimerConfig::new(10, 5).unwrap();
        scheduler.start(config).unwrap();
        tick_n(&scheduler, config.activity_seconds() + config.rest_seconds());

        let summary = scheduler.stop(false).unwrap();
        assert_eq!(summary.total_cycles, 1);
        assert!(!summary.manually_ended);

        assert!(scheduler.start(config).is_ok());
    }

    #[test]
    fn tick_after_stop_is_noop() {
        let scheduler = PhaseScheduler::new();
        scheduler.start(TimerConfig::default()).unwrap();
        scheduler.stop(true);
        assert_eq!(scheduler.tick().phase, Phase::Idle);
    }
}
