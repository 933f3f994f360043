//! In-memory simulation of the remote session service.
//!
//! Behaves like the live backend closely enough for offline development and
//! tests: fixtures are generated from a seeded RNG, every call waits for a
//! bounded random latency and credentials flow through the shared
//! [`TokenStore`].

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cadence_core::{RemoteSyncClient, TokenStore};
use cadence_domain::constants::{
    MIN_PASSWORD_LENGTH, STUB_FIXTURE_COUNT, STUB_LATENCY_MAX_MS, STUB_LATENCY_MIN_MS,
    STUB_TOKEN_PREFIX, STUB_USER_ID,
};
use cadence_domain::{
    AuthSession, CadenceError, Leaderboard, LeaderboardEntry, PushReceipt, RemoteConfig,
    RemoteStats, Result, SyncEnvelope,
};
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};
use uuid::Uuid;

const ROSTER: [&str; 10] =
    ["Alex", "Jordan", "Morgan", "Casey", "Riley", "Sam", "Taylor", "Drew", "Quinn", "Avery"];

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Stub behaviour knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubConfig {
    pub fixtures: usize,
    pub latency_ms: RangeInclusive<u64>,
    pub seed: u64,
}

impl StubConfig {
    /// Zero latency, default fixtures. Intended for tests.
    pub fn instant() -> Self {
        Self { latency_ms: 0..=0, ..Self::default() }
    }

    pub fn with_fixtures(mut self, fixtures: usize) -> Self {
        self.fixtures = fixtures;
        self
    }
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            fixtures: STUB_FIXTURE_COUNT,
            latency_ms: STUB_LATENCY_MIN_MS..=STUB_LATENCY_MAX_MS,
            seed: 42,
        }
    }
}

impl From<&RemoteConfig> for StubConfig {
    fn from(config: &RemoteConfig) -> Self {
        let min = config.stub_latency_min_ms.min(config.stub_latency_max_ms);
        let max = config.stub_latency_min_ms.max(config.stub_latency_max_ms);
        Self { fixtures: STUB_FIXTURE_COUNT, latency_ms: min..=max, seed: config.stub_seed }
    }
}

struct StubState {
    sessions: Vec<SyncEnvelope>,
    rng: StdRng,
    last_credential: Option<String>,
}

/// Simulated remote backend.
pub struct StubRemoteClient {
    tokens: Arc<dyn TokenStore>,
    latency_ms: RangeInclusive<u64>,
    issued_token: String,
    state: Mutex<StubState>,
}

impl StubRemoteClient {
    pub fn new(config: StubConfig, tokens: Arc<dyn TokenStore>) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let sessions = generate_fixtures(&mut rng, config.fixtures);
        Self {
            tokens,
            latency_ms: config.latency_ms,
            issued_token: format!("{STUB_TOKEN_PREFIX}{}", Uuid::new_v4()),
            state: Mutex::new(StubState { sessions, rng, last_credential: None }),
        }
    }

    /// Credential observed on the most recent call, if one was stored.
    pub fn last_credential(&self) -> Option<String> {
        self.state.lock().last_credential.clone()
    }

    /// Number of sessions currently held by the simulated backend.
    pub fn stored_sessions(&self) -> usize {
        self.state.lock().sessions.len()
    }

    async fn simulate_call(&self) -> Result<()> {
        let token = self.tokens.token().await?;
        let delay = {
            let mut state = self.state.lock();
            state.last_credential = token;
            if self.latency_ms.is_empty() {
                0
            } else {
                state.rng.gen_range(self.latency_ms.clone())
            }
        };
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(())
    }

    async fn issue(&self, email: &str) -> Result<AuthSession> {
        let session = AuthSession {
            token: self.issued_token.clone(),
            user_id: STUB_USER_ID.to_string(),
            email: email.to_string(),
        };
        self.tokens.save(&session).await?;
        Ok(session)
    }
}

#[async_trait]
impl RemoteSyncClient for StubRemoteClient {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.simulate_call().await?;
        if email.is_empty() || password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CadenceError::Unauthorized);
        }
        self.issue(email).await
    }

    #[instrument(skip(self, password))]
    async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthSession> {
        self.simulate_call().await?;
        if !email.contains('@') || password.chars().count() < MIN_PASSWORD_LENGTH || name.is_empty()
        {
            return Err(CadenceError::rejected("Invalid registration data"));
        }
        self.issue(email).await
    }

    async fn logout(&self) -> Result<()> {
        self.simulate_call().await?;
        self.tokens.clear().await
    }

    #[instrument(skip(self, batch), fields(batch_len = batch.len()))]
    async fn push_sessions(&self, batch: &[SyncEnvelope]) -> Result<PushReceipt> {
        self.simulate_call().await?;

        let mut state = self.state.lock();
        let mut accepted = 0u32;
        for envelope in batch {
            let Some(id) = envelope.id else { continue };
            if state.sessions.iter().any(|existing| existing.id == Some(id)) {
                continue;
            }
            state.sessions.push(envelope.clone());
            accepted += 1;
        }
        debug!(accepted, received = batch.len(), "stub merged session batch");

        Ok(PushReceipt {
            accepted_count: accepted,
            message: Some(format!("Successfully synced {} sessions", batch.len())),
        })
    }

    async fn fetch_sessions(&self) -> Result<Vec<SyncEnvelope>> {
        self.simulate_call().await?;
        let mut sessions = self.state.lock().sessions.clone();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    async fn fetch_stats(&self) -> Result<RemoteStats> {
        self.simulate_call().await?;
        let mut state = self.state.lock();
        let streak_days = state.rng.gen_range(1..15);
        Ok(compute_stats(&state.sessions, streak_days))
    }

    async fn fetch_leaderboard(&self, limit: usize) -> Result<Leaderboard> {
        self.simulate_call().await?;
        let mut state = self.state.lock();

        let mut entries: Vec<LeaderboardEntry> = ROSTER
            .iter()
            .enumerate()
            .map(|(index, name)| LeaderboardEntry {
                user_id: format!("user_{index}"),
                name: (*name).to_string(),
                total_cycles: state.rng.gen_range(50..500),
                rank: 0,
            })
            .collect();
        entries.sort_by(|a, b| b.total_cycles.cmp(&a.total_cycles));
        entries.truncate(limit);
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.rank = u32::try_from(index + 1).unwrap_or(u32::MAX);
        }

        Ok(Leaderboard { entries, user_rank: Some(state.rng.gen_range(1..100)) })
    }

    async fn ping(&self) -> Result<bool> {
        self.simulate_call().await?;
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "stub"
    }
}

/// One completed session per past day, ids `-1..=-count`.
///
/// Local store ids are positive, so pushed sessions never match a fixture.
fn generate_fixtures(rng: &mut StdRng, count: usize) -> Vec<SyncEnvelope> {
    let now = Utc::now().timestamp_millis();
    (1..=count)
        .filter_map(|day| {
            let day = i64::try_from(day).ok()?;
            let start_ms = now - day * DAY_MS - rng.gen_range(0..DAY_MS);
            let start_time = chrono::DateTime::from_timestamp_millis(start_ms)?;
            let duration = ChronoDuration::minutes(rng.gen_range(30..180));
            Some(SyncEnvelope {
                id: Some(-day),
                start_time,
                end_time: Some(start_time + duration),
                activity_minutes: rng.gen_range(20..60),
                rest_minutes: rng.gen_range(10..30),
                completed_cycles: rng.gen_range(2..8),
                manually_ended: rng.gen_bool(0.5),
            })
        })
        .collect()
}

fn compute_stats(sessions: &[SyncEnvelope], streak_days: u32) -> RemoteStats {
    let total_cycles = sessions.iter().map(|s| s.completed_cycles).sum();
    let total_activity_minutes =
        sessions.iter().map(|s| u64::from(s.activity_minutes) * u64::from(s.completed_cycles)).sum();
    let total_rest_minutes =
        sessions.iter().map(|s| u64::from(s.rest_minutes) * u64::from(s.completed_cycles)).sum();

    let durations: Vec<i64> = sessions
        .iter()
        .filter_map(|s| s.end_time.map(|end| (end - s.start_time).num_minutes()))
        .collect();
    let average_session_minutes = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<i64>() as f64 / durations.len() as f64
    };

    RemoteStats {
        user_id: STUB_USER_ID.to_string(),
        total_sessions: u32::try_from(sessions.len()).unwrap_or(u32::MAX),
        total_cycles,
        total_activity_minutes,
        total_rest_minutes,
        average_session_minutes,
        last_session_at: sessions.iter().map(|s| s.start_time).max(),
        streak_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn client() -> (StubRemoteClient, Arc<MemoryTokenStore>) {
        let tokens = Arc::new(MemoryTokenStore::new());
        (StubRemoteClient::new(StubConfig::instant(), tokens.clone()), tokens)
    }

    #[test]
    fn fixtures_are_one_per_past_day() {
        let mut rng = StdRng::seed_from_u64(7);
        let fixtures = generate_fixtures(&mut rng, 10);
        assert_eq!(fixtures.len(), 10);

        let now = Utc::now();
        for (index, fixture) in fixtures.iter().enumerate() {
            assert_eq!(fixture.id, Some(-(index as i64 + 1)));
            assert!(fixture.start_time < now);
            assert!(fixture.end_time.is_some());
            assert!((2..8).contains(&fixture.completed_cycles));
        }
    }

    #[test]
    fn same_seed_same_fixtures() {
        let a = generate_fixtures(&mut StdRng::seed_from_u64(1), 5);
        let b = generate_fixtures(&mut StdRng::seed_from_u64(1), 5);
        let cycles = |v: &[SyncEnvelope]| v.iter().map(|s| s.completed_cycles).collect::<Vec<_>>();
        assert_eq!(cycles(&a), cycles(&b));
    }

    #[test]
    fn stats_follow_session_list() {
        let mut rng = StdRng::seed_from_u64(3);
        let fixtures = generate_fixtures(&mut rng, 4);
        let stats = compute_stats(&fixtures, 5);

        assert_eq!(stats.total_sessions, 4);
        assert_eq!(stats.total_cycles, fixtures.iter().map(|s| s.completed_cycles).sum::<u32>());
        assert_eq!(stats.last_session_at, fixtures.iter().map(|s| s.start_time).max());
        assert!(stats.average_session_minutes >= 30.0);
        assert_eq!(stats.streak_days, 5);
    }

    #[test]
    fn empty_stats_are_zeroed() {
        let stats = compute_stats(&[], 1);
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.average_session_minutes, 0.0);
        assert!(stats.last_session_at.is_none());
    }

    #[tokio::test]
    async fn register_validates_all_fields() {
        let (client, _) = client();
        assert!(client.register("no-at-sign", "longenough", "Sam").await.is_err());
        assert!(client.register("a@b.com", "short", "Sam").await.is_err());
        assert!(client.register("a@b.com", "longenough", "").await.is_err());

        let session = client.register("a@b.com", "longenough", "Sam").await.unwrap();
        assert!(session.token.starts_with(STUB_TOKEN_PREFIX));
        assert_eq!(session.user_id, STUB_USER_ID);
    }

    #[tokio::test]
    async fn logout_clears_token() {
        let (client, tokens) = client();
        client.login("a@b.com", "longenough").await.unwrap();
        assert!(tokens.is_logged_in().await.unwrap());

        client.logout().await.unwrap();
        assert!(!tokens.is_logged_in().await.unwrap());
    }

    #[tokio::test]
    async fn leaderboard_is_ranked_and_truncated() {
        let (client, _) = client();
        let board = client.fetch_leaderboard(3).await.unwrap();

        assert_eq!(board.entries.len(), 3);
        assert_eq!(board.entries.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(board.entries.windows(2).all(|w| w[0].total_cycles >= w[1].total_cycles));
        assert!(board.entries.iter().all(|e| ROSTER.contains(&e.name.as_str())));
    }

    #[tokio::test]
    async fn push_skips_envelopes_without_id() {
        let (client, _) = client();
        let mut envelope = client.fetch_sessions().await.unwrap().remove(0);
        envelope.id = None;

        let receipt = client.push_sessions(&[envelope]).await.unwrap();
        assert_eq!(receipt.accepted_count, 0);
        assert_eq!(client.stored_sessions(), STUB_FIXTURE_COUNT);
    }
}
