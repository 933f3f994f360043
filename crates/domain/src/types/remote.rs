//! Payloads exchanged with the remote session service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::SyncEnvelope;

/// Generic response wrapper returned by every remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }
}

/// Credentials issued by a successful login or registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user_id: String,
    pub email: String,
}

// Keep tokens out of logs.
impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"***")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Body of a batch push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushBatch {
    pub sessions: Vec<SyncEnvelope>,
}

/// Outcome of a batch push. `accepted_count` only counts envelopes the remote
/// store had not seen before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReceipt {
    pub accepted_count: u32,
    #[serde(default)]
    pub message: Option<String>,
}

/// Aggregate statistics kept by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStats {
    pub user_id: String,
    pub total_sessions: u32,
    pub total_cycles: u32,
    pub total_activity_minutes: u64,
    pub total_rest_minutes: u64,
    pub average_session_minutes: f64,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_session_at: Option<DateTime<Utc>>,
    pub streak_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    pub total_cycles: u32,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub user_rank: Option<u32>,
}
