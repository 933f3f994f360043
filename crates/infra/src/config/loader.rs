//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `CADENCE_DB_PATH` is unset, falls back to loading from file
//! 3. Searches several paths for a config file
//! 4. Supports JSON and TOML formats
//! 5. Uses built-in defaults when no file exists anywhere
//!
//! ## Environment Variables
//! - `CADENCE_DB_PATH`: Database file path (required for env loading)
//! - `CADENCE_DB_POOL_SIZE`: Connection pool size
//! - `CADENCE_DB_ENCRYPTION_KEY`: SQLCipher key
//! - `CADENCE_REQUEST_TIMEOUT`: Per-request HTTP timeout in seconds
//! - `CADENCE_SYNC_TIMEOUT`: Bound on full syncs and remote stats, in seconds
//! - `CADENCE_STUB_LATENCY_MIN_MS` / `CADENCE_STUB_LATENCY_MAX_MS`: Stub
//!   backend latency range
//! - `CADENCE_STUB_SEED`: Stub fixture seed
//! - `CADENCE_ACTIVITY_MINUTES` / `CADENCE_REST_MINUTES`: Default timer
//! - `CADENCE_TICK_INTERVAL_MS`: Wall-clock milliseconds per timer second
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./cadence.json` or `./cadence.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use cadence_domain::{CadenceError, Config, DatabaseConfig, RemoteConfig, Result, TimerDefaults};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `CadenceError::Config` if an environment value or the located
/// file is invalid.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            match find_config_file() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::warn!("No config file found; using built-in defaults");
                    Ok(Config::default())
                }
            }
        }
    }
}

/// Load configuration from environment variables
///
/// Only `CADENCE_DB_PATH` is required; every other variable falls back to
/// its default.
///
/// # Errors
/// Returns `CadenceError::Config` if `CADENCE_DB_PATH` is missing or any
/// present variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("CADENCE_DB_PATH")?;
    let database_defaults = DatabaseConfig::default();
    let remote_defaults = RemoteConfig::default();
    let timer_defaults = TimerDefaults::default();

    Ok(Config {
        database: DatabaseConfig {
            path: db_path,
            pool_size: env_parse("CADENCE_DB_POOL_SIZE", database_defaults.pool_size)?,
            encryption_key: std::env::var("CADENCE_DB_ENCRYPTION_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
        },
        remote: RemoteConfig {
            request_timeout_secs: env_parse(
                "CADENCE_REQUEST_TIMEOUT",
                remote_defaults.request_timeout_secs,
            )?,
            sync_timeout_secs: env_parse("CADENCE_SYNC_TIMEOUT", remote_defaults.sync_timeout_secs)?,
            stub_latency_min_ms: env_parse(
                "CADENCE_STUB_LATENCY_MIN_MS",
                remote_defaults.stub_latency_min_ms,
            )?,
            stub_latency_max_ms: env_parse(
                "CADENCE_STUB_LATENCY_MAX_MS",
                remote_defaults.stub_latency_max_ms,
            )?,
            stub_seed: env_parse("CADENCE_STUB_SEED", remote_defaults.stub_seed)?,
        },
        timer: TimerDefaults {
            activity_minutes: env_parse(
                "CADENCE_ACTIVITY_MINUTES",
                timer_defaults.activity_minutes,
            )?,
            rest_minutes: env_parse("CADENCE_REST_MINUTES", timer_defaults.rest_minutes)?,
            tick_interval_ms: env_parse(
                "CADENCE_TICK_INTERVAL_MS",
                timer_defaults.tick_interval_ms,
            )?,
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, searches several locations for a config file.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CadenceError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CadenceError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => find_config_file().ok_or_else(|| {
            CadenceError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CadenceError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, detecting the format from the
/// file extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CadenceError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file among the search paths
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn find_config_file() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidate_files(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidate_files(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidate_files(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("cadence.json"),
        dir.join("cadence.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CadenceError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable, returning `default` when unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| CadenceError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
