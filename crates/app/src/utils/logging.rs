use std::time::Duration;

use cadence_domain::CadenceError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log output format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "CADENCE_LOG_FORMAT";

/// Install the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Logs go to stderr so
/// command output on stdout stays clean. Calling this twice is harmless; the
/// second install is ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|value| value.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = if json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.with_target(false).try_init()
    };

    if installed.is_err() {
        warn!("tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// `command` must be a stable identifier without user data.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&CadenceError>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(err) => warn!(
            command,
            duration_ms,
            error_type = error_label(err),
            error = %err,
            "command_execution_failure"
        ),
    }
}

/// Convert a `CadenceError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &CadenceError) -> &'static str {
    match error {
        CadenceError::InvalidConfig(_) => "invalid_config",
        CadenceError::NotFound(_) => "not_found",
        CadenceError::SyncDisabled => "sync_disabled",
        CadenceError::Unauthorized => "unauthorized",
        CadenceError::NetworkUnavailable(_) => "network_unavailable",
        CadenceError::RemoteRejected { .. } => "remote_rejected",
        CadenceError::Database(_) => "database",
        CadenceError::Config(_) => "config",
        CadenceError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(error_label(&CadenceError::SyncDisabled), "sync_disabled");
        assert_eq!(error_label(&CadenceError::rejected("quota")), "remote_rejected");
        assert_eq!(error_label(&CadenceError::Database("locked".into())), "database");
    }
}
