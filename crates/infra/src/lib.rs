//! # Cadence Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite/SQLCipher session store and settings)
//! - Remote session service clients (HTTP and in-memory stub)
//! - Credential storage (in-memory and OS keychain)
//! - The tokio tick driver for the phase scheduler
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `cadence-core`
//! - Contains all "impure" code (I/O, network, keychain)

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod remote;
pub mod scheduling;

// Re-export commonly used items
pub use auth::{KeychainTokenStore, MemoryTokenStore};
pub use database::{DbManager, SqliteSessionStore, SqliteSettingsRepository};
pub use errors::InfraError;
pub use http::HttpClient;
pub use remote::{build_remote_client, LiveRemoteClient, StubConfig, StubRemoteClient};
pub use scheduling::{SchedulerError, TimerDriver, TimerDriverConfig};
