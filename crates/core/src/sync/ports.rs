//! Port interfaces for session persistence and remote sync
//!
//! These traits define the boundaries between the sync repository and the
//! storage, network and credential adapters behind it.

use async_trait::async_trait;
use cadence_domain::{
    AuthSession, Leaderboard, PushReceipt, RemoteStats, Result, Session, SyncEnvelope,
};

/// Durable collection of session records. No business logic lives here.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session and return its assigned id.
    async fn insert(&self, session: &Session) -> Result<i64>;

    /// Overwrite an existing session. `NotFound` if the id is unknown.
    async fn update(&self, session: &Session) -> Result<()>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Session>>;

    /// Most recent sessions first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Session>>;

    /// Every session, most recent first.
    async fn list_all(&self) -> Result<Vec<Session>>;

    /// Number of sessions with an end time.
    async fn count_completed(&self) -> Result<u64>;

    /// Sum of completed cycles over all sessions.
    async fn sum_cycles(&self) -> Result<u64>;
}

/// Remote session service. Implemented by a live HTTP client and by an
/// in-memory simulator with identical contracts.
///
/// Every failure is `Unauthorized`, `NetworkUnavailable` or `RemoteRejected`.
#[async_trait]
pub trait RemoteSyncClient: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthSession>;

    /// Drop the stored credential. The local token is cleared even when the
    /// remote call fails.
    async fn logout(&self) -> Result<()>;

    /// Submit a batch; merging is idempotent by session identity.
    async fn push_sessions(&self, batch: &[SyncEnvelope]) -> Result<PushReceipt>;

    /// Remote sessions, newest first.
    async fn fetch_sessions(&self) -> Result<Vec<SyncEnvelope>>;

    async fn fetch_stats(&self) -> Result<RemoteStats>;

    async fn fetch_leaderboard(&self, limit: usize) -> Result<Leaderboard>;

    /// Reachability check.
    async fn ping(&self) -> Result<bool>;

    /// Short name for logs ("stub" or "live").
    fn backend_name(&self) -> &'static str;
}

/// Credential storage shared by the remote clients.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn credentials(&self) -> Result<Option<AuthSession>>;

    async fn token(&self) -> Result<Option<String>> {
        Ok(self.credentials().await?.map(|session| session.token))
    }

    async fn save(&self, session: &AuthSession) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    async fn is_logged_in(&self) -> Result<bool> {
        Ok(self.token().await?.is_some())
    }
}
