//! Interval timer: phase scheduler, events and the session-recording service

pub mod events;
pub mod scheduler;
pub mod service;

pub use events::{ChannelSink, LoggingSink, TimerEvent, TimerEventSink};
pub use scheduler::{PhaseScheduler, RunHandle, RunSummary, TimerSnapshot};
pub use service::IntervalTimer;
