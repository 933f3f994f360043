//! Statistics shown to the user

use serde::{Deserialize, Serialize};

use super::remote::RemoteStats;

/// Local counters plus remote statistics when they could be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedStats {
    /// Sessions with an end time.
    pub local_sessions: u64,
    /// Sum of completed cycles over every local session.
    pub local_cycles: u64,
    pub remote: Option<RemoteStats>,
}

impl CombinedStats {
    pub fn local_only(local_sessions: u64, local_cycles: u64) -> Self {
        Self { local_sessions, local_cycles, remote: None }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }
}
