//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Timer bounds (inclusive)
pub const MIN_ACTIVITY_MINUTES: u32 = 10;
pub const MAX_ACTIVITY_MINUTES: u32 = 120;
pub const MIN_REST_MINUTES: u32 = 5;
pub const MAX_REST_MINUTES: u32 = 180;

pub const DEFAULT_ACTIVITY_MINUTES: u32 = 30;
pub const DEFAULT_REST_MINUTES: u32 = 10;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

// Session history
pub const RECENT_SESSIONS_LIMIT: usize = 50;

// Remote sync
pub const DEFAULT_API_BASE_URL: &str = "https://api.example.com/v1/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

// Stub backend
pub const STUB_FIXTURE_COUNT: usize = 10;
pub const STUB_LATENCY_MIN_MS: u64 = 300;
pub const STUB_LATENCY_MAX_MS: u64 = 1000;
pub const STUB_USER_ID: &str = "stub_user_123";
pub const STUB_TOKEN_PREFIX: &str = "stub_token_";
pub const MIN_PASSWORD_LENGTH: usize = 6;

// Persisted settings keys
pub const SETTING_SYNC_ENABLED: &str = "sync_enabled";
pub const SETTING_USE_STUB_API: &str = "use_stub_api";
pub const SETTING_API_BASE_URL: &str = "api_base_url";
