//! Database implementations

pub mod manager;
pub mod session_repository;
pub mod settings_repository;
pub mod sqlcipher_pool;

pub use manager::*;
pub use session_repository::*;
pub use settings_repository::*;
pub use sqlcipher_pool::*;

use cadence_domain::CadenceError;
use tokio::task;

/// Map JoinError from spawn_blocking to CadenceError.
pub(crate) fn map_join_error(err: task::JoinError) -> CadenceError {
    if err.is_cancelled() {
        CadenceError::Internal("blocking task cancelled".into())
    } else {
        CadenceError::Internal(format!("blocking task failed: {err}"))
    }
}
