//! Persisted remote settings.
//!
//! Backend mode and base URL are read when the context is built, so changes to
//! them apply on the next start. The sync flag applies immediately.

use cadence_core::RemoteSettings;
use cadence_domain::Result;

use super::instrumented;
use crate::AppContext;

pub async fn show_settings(ctx: &AppContext) -> Result<RemoteSettings> {
    instrumented("settings::show", ctx.settings.remote_settings()).await
}

pub async fn set_sync(ctx: &AppContext, enabled: bool) -> Result<()> {
    instrumented("settings::set_sync", ctx.set_sync_enabled(enabled)).await
}

pub async fn set_use_stub(ctx: &AppContext, use_stub: bool) -> Result<()> {
    instrumented("settings::set_use_stub", ctx.settings.set_use_stub_api(use_stub)).await
}

pub async fn set_api_base_url(ctx: &AppContext, url: &str) -> Result<()> {
    instrumented("settings::set_api_base_url", ctx.settings.set_api_base_url(url)).await
}
