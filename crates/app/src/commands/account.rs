//! Authentication and remote-only queries.

use cadence_domain::{AuthSession, Leaderboard, Result};

use super::instrumented;
use crate::AppContext;

/// Default number of leaderboard rows.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<AuthSession> {
    instrumented("account::login", ctx.remote.login(email, password)).await
}

pub async fn register(
    ctx: &AppContext,
    email: &str,
    password: &str,
    name: &str,
) -> Result<AuthSession> {
    instrumented("account::register", ctx.remote.register(email, password, name)).await
}

/// Drop the stored credential. The local credential is gone even when the
/// remote call fails.
pub async fn logout(ctx: &AppContext) -> Result<()> {
    instrumented("account::logout", ctx.remote.logout()).await
}

pub async fn leaderboard(ctx: &AppContext, limit: usize) -> Result<Leaderboard> {
    instrumented("account::leaderboard", ctx.remote.fetch_leaderboard(limit)).await
}

pub async fn ping(ctx: &AppContext) -> Result<bool> {
    instrumented("account::ping", ctx.remote.ping()).await
}
