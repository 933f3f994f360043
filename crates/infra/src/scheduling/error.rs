//! Scheduler error types

use std::time::Duration;

use cadence_domain::CadenceError;
use thiserror::Error;

use crate::errors::InfraError;

/// Errors raised by background task lifecycles.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    /// Operation timed out
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<tokio::task::JoinError> for SchedulerError {
    fn from(err: tokio::task::JoinError) -> Self {
        SchedulerError::TaskJoinFailed(err.to_string())
    }
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let cadence_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                CadenceError::InvalidConfig(err.to_string())
            }
            _ => CadenceError::Internal(err.to_string()),
        };
        InfraError(cadence_err)
    }
}

impl From<SchedulerError> for CadenceError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_convert_to_domain() {
        let err: CadenceError = SchedulerError::AlreadyRunning.into();
        assert!(matches!(err, CadenceError::InvalidConfig(_)));

        let err: CadenceError =
            SchedulerError::Timeout { duration: Duration::from_secs(5) }.into();
        match err {
            CadenceError::Internal(message) => assert!(message.contains("5s")),
            other => panic!("expected internal error, got {other:?}"),
        }
    }
}
