//! Domain types and models

pub mod remote;
pub mod session;
pub mod stats;
pub mod timer;

pub use remote::{
    ApiResponse, AuthSession, Leaderboard, LeaderboardEntry, LoginRequest, PushBatch, PushReceipt,
    RegisterRequest, RemoteStats,
};
pub use session::{now_millis, truncate_to_millis, Session, SyncEnvelope};
pub use stats::CombinedStats;
pub use timer::{Phase, TimerConfig};
