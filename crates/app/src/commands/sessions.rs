//! Local history, statistics and manual sync.

use cadence_domain::{CombinedStats, Result, Session};

use super::instrumented;
use crate::AppContext;

/// Default number of sessions listed by [`history`].
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Most recent local sessions, newest first.
pub async fn history(ctx: &AppContext, limit: usize) -> Result<Vec<Session>> {
    instrumented("sessions::history", ctx.repository.recent_sessions(limit)).await
}

/// Local counters, plus remote totals when the backend answers in time.
pub async fn stats(ctx: &AppContext) -> Result<CombinedStats> {
    instrumented("sessions::stats", ctx.repository.combined_stats()).await
}

/// Push every unsynced session. Returns how many were accepted.
pub async fn sync(ctx: &AppContext) -> Result<u32> {
    instrumented("sessions::sync", ctx.repository.sync_all()).await
}
