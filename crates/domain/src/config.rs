//! Application configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACTIVITY_MINUTES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_REST_MINUTES,
    DEFAULT_SYNC_TIMEOUT_SECS, DEFAULT_TICK_INTERVAL_MS, STUB_LATENCY_MAX_MS, STUB_LATENCY_MIN_MS,
};

/// Root configuration loaded at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub timer: TimerDefaults,
}

/// Local session database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// SQLCipher key. Plain SQLite when absent.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "cadence.db".to_string(), pool_size: default_pool_size(), encryption_key: None }
    }
}

fn default_pool_size() -> u32 {
    4
}

/// Timeouts for remote calls and the stub backend's simulated latency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub request_timeout_secs: u64,
    /// Bound on `sync_all` and remote stats reads.
    pub sync_timeout_secs: u64,
    pub stub_latency_min_ms: u64,
    pub stub_latency_max_ms: u64,
    pub stub_seed: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            sync_timeout_secs: DEFAULT_SYNC_TIMEOUT_SECS,
            stub_latency_min_ms: STUB_LATENCY_MIN_MS,
            stub_latency_max_ms: STUB_LATENCY_MAX_MS,
            stub_seed: 42,
        }
    }
}

/// Defaults used when the caller does not supply a timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerDefaults {
    pub activity_minutes: u32,
    pub rest_minutes: u32,
    pub tick_interval_ms: u64,
}

impl Default for TimerDefaults {
    fn default() -> Self {
        Self {
            activity_minutes: DEFAULT_ACTIVITY_MINUTES,
            rest_minutes: DEFAULT_REST_MINUTES,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}
