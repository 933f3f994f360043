//! Command handlers behind the `cadence` binary.
//!
//! Each handler takes the shared [`AppContext`](crate::AppContext), runs one
//! operation and logs its outcome. Rendering is left to the caller.

pub mod account;
pub mod sessions;
pub mod settings;

use std::future::Future;
use std::time::Instant;

use cadence_domain::Result;

use crate::utils::log_command_execution;

pub use account::{leaderboard, login, logout, ping, register};
pub use sessions::{history, stats, sync};
pub use settings::{set_api_base_url, set_sync, set_use_stub, show_settings};

/// Run `operation`, logging its duration and outcome under `command`.
pub(crate) async fn instrumented<T, F>(command: &'static str, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = operation.await;
    log_command_execution(command, start.elapsed(), result.as_ref().err());
    result
}
