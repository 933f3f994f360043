//! Settings port for user-facing sync preferences.
//!
//! Settings persist across restarts and are read when the application
//! context wires the remote client and the sync repository.
//!
//! # Example
//!
//! ```no_run
//! use cadence_core::SettingsPort;
//!
//! async fn offline_mode(settings: &impl SettingsPort) -> bool {
//!     !settings.sync_enabled().await.unwrap_or(false)
//! }
//! ```

use async_trait::async_trait;
use cadence_domain::constants::DEFAULT_API_BASE_URL;
use cadence_domain::Result;

/// Snapshot of the remote-related settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub sync_enabled: bool,
    pub use_stub: bool,
    pub base_url: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self { sync_enabled: false, use_stub: true, base_url: DEFAULT_API_BASE_URL.to_string() }
    }
}

/// Port for reading and writing sync preferences.
///
/// Missing values fall back to the defaults in [`RemoteSettings::default`].
#[async_trait]
pub trait SettingsPort: Send + Sync {
    async fn sync_enabled(&self) -> Result<bool>;

    async fn set_sync_enabled(&self, enabled: bool) -> Result<()>;

    async fn use_stub_api(&self) -> Result<bool>;

    async fn set_use_stub_api(&self, use_stub: bool) -> Result<()>;

    async fn api_base_url(&self) -> Result<String>;

    async fn set_api_base_url(&self, url: &str) -> Result<()>;

    /// Read all remote settings at once.
    async fn remote_settings(&self) -> Result<RemoteSettings> {
        Ok(RemoteSettings {
            sync_enabled: self.sync_enabled().await?,
            use_stub: self.use_stub_api().await?,
            base_url: self.api_base_url().await?,
        })
    }
}
