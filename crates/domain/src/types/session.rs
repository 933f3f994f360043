//! Timer session records and their wire projection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timer::TimerConfig;

/// Current time truncated to millisecond precision.
///
/// Session timestamps never carry sub-millisecond detail so that the epoch-ms
/// wire form maps back to the exact same value.
pub fn now_millis() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

/// Drop sub-millisecond precision from a timestamp.
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

/// One timer run as persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Assigned by the session store on insert.
    pub id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub activity_minutes: u32,
    pub rest_minutes: u32,
    pub completed_cycles: u32,
    pub manually_ended: bool,
    /// Local bookkeeping; never sent over the wire.
    pub synced: bool,
}

impl Session {
    /// A fresh, unpersisted session starting now.
    pub fn start(config: &TimerConfig) -> Self {
        Self::start_at(config, now_millis())
    }

    pub fn start_at(config: &TimerConfig, start_time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            start_time: truncate_to_millis(start_time),
            end_time: None,
            activity_minutes: config.activity_minutes,
            rest_minutes: config.rest_minutes,
            completed_cycles: 0,
            manually_ended: false,
            synced: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.end_time.is_some()
    }

    /// Wire projection of this session.
    pub fn envelope(&self) -> SyncEnvelope {
        SyncEnvelope::from(self)
    }

    /// Equal in everything except the `synced` flag.
    pub fn same_content(&self, other: &Self) -> bool {
        self.envelope() == other.envelope()
    }

    /// Minutes spent in this session, or `None` while it is still running.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end_time.map(|end| (end - self.start_time).num_minutes())
    }
}

/// Session as exchanged with the remote store: every field except `synced`,
/// timestamps as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEnvelope {
    pub id: Option<i64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub end_time: Option<DateTime<Utc>>,
    pub activity_minutes: u32,
    pub rest_minutes: u32,
    pub completed_cycles: u32,
    pub manually_ended: bool,
}

impl From<&Session> for SyncEnvelope {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            start_time: session.start_time,
            end_time: session.end_time,
            activity_minutes: session.activity_minutes,
            rest_minutes: session.rest_minutes,
            completed_cycles: session.completed_cycles,
            manually_ended: session.manually_ended,
        }
    }
}

impl From<Session> for SyncEnvelope {
    fn from(session: Session) -> Self {
        Self::from(&session)
    }
}

impl From<SyncEnvelope> for Session {
    fn from(envelope: SyncEnvelope) -> Self {
        Self {
            id: envelope.id,
            start_time: envelope.start_time,
            end_time: envelope.end_time,
            activity_minutes: envelope.activity_minutes,
            rest_minutes: envelope.rest_minutes,
            completed_cycles: envelope.completed_cycles,
            manually_ended: envelope.manually_ended,
            synced: false,
        }
    }
}
