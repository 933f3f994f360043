//! # Cadence Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The activity/rest phase scheduler and its events
//! - The local-first sync repository and background push queue
//! - Port/adapter interfaces (traits) for storage, remote sync and settings
//!
//! ## Architecture Principles
//! - Only depends on `cadence-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod sync;
pub mod timer;

// Infrastructure ports
pub mod settings_ports;

// Re-export specific items to avoid ambiguity
pub use settings_ports::{RemoteSettings, SettingsPort};
pub use sync::ports::{RemoteSyncClient, SessionStore, TokenStore};
pub use sync::{PushOutcome, PushQueue, SyncRepository};
pub use timer::{
    ChannelSink, IntervalTimer, LoggingSink, PhaseScheduler, RunHandle, RunSummary, TimerEvent,
    TimerEventSink, TimerSnapshot,
};
