//! Backend selection for the remote session service.

use std::sync::Arc;
use std::time::Duration;

use cadence_core::{RemoteSettings, RemoteSyncClient, TokenStore};
use cadence_domain::{RemoteConfig, Result};
use tracing::info;

use super::live::LiveRemoteClient;
use super::stub::{StubConfig, StubRemoteClient};

/// Build the client selected by `settings`. The choice is fixed for the
/// lifetime of the returned client.
pub fn build_remote_client(
    settings: &RemoteSettings,
    config: &RemoteConfig,
    tokens: Arc<dyn TokenStore>,
) -> Result<Arc<dyn RemoteSyncClient>> {
    let client: Arc<dyn RemoteSyncClient> = if settings.use_stub {
        Arc::new(StubRemoteClient::new(StubConfig::from(config), tokens))
    } else {
        Arc::new(LiveRemoteClient::new(
            &settings.base_url,
            Duration::from_secs(config.request_timeout_secs.max(1)),
            tokens,
        )?)
    };

    info!(
        backend = client.backend_name(),
        base_url = %settings.base_url,
        sync_enabled = settings.sync_enabled,
        "remote client configured"
    );
    Ok(client)
}

#[cfg(test)]
mod tests {
    use cadence_domain::CadenceError;

    use super::*;
    use crate::auth::MemoryTokenStore;

    #[test]
    fn selects_backend_from_settings() {
        let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let config = RemoteConfig::default();

        let stub = build_remote_client(&RemoteSettings::default(), &config, tokens.clone()).unwrap();
        assert_eq!(stub.backend_name(), "stub");

        let live_settings = RemoteSettings { use_stub: false, ..RemoteSettings::default() };
        let live = build_remote_client(&live_settings, &config, tokens.clone()).unwrap();
        assert_eq!(live.backend_name(), "live");
    }

    #[test]
    fn live_backend_requires_valid_url() {
        let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let settings =
            RemoteSettings { use_stub: false, base_url: "nonsense".into(), sync_enabled: true };
        let err = build_remote_client(&settings, &RemoteConfig::default(), tokens).err();
        assert!(matches!(err, Some(CadenceError::InvalidConfig(_))));
    }
}
