//! Token stores backing `TokenStore`.
//!
//! `MemoryTokenStore` keeps the credential for the lifetime of the process
//! (stub mode and tests). `KeychainTokenStore` persists it in the OS keychain
//! as JSON so a live session survives restarts.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::TokenStore;
use cadence_domain::{AuthSession, CadenceError, Result};
use keyring::Entry;
use parking_lot::RwLock;
use tokio::task;
use tracing::{debug, warn};

use crate::errors::InfraError;

const SERVICE_NAME: &str = "com.cadence.app";
const ACCOUNT_NAME: &str = "remote_session";

/// In-process credential holder.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: RwLock<Option<AuthSession>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: AuthSession) -> Self {
        Self { session: RwLock::new(Some(session)) }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn credentials(&self) -> Result<Option<AuthSession>> {
        Ok(self.session.read().clone())
    }

    async fn save(&self, session: &AuthSession) -> Result<()> {
        *self.session.write() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.session.write().take();
        Ok(())
    }
}

/// Credential persisted in the system keychain.
///
/// Keychain calls block, so each one runs on the blocking pool.
pub struct KeychainTokenStore {
    entry: Arc<Entry>,
}

impl KeychainTokenStore {
    /// Open the default keychain entry for the remote session.
    pub fn new() -> Result<Self> {
        Self::for_account(SERVICE_NAME, ACCOUNT_NAME)
    }

    pub fn for_account(service: &str, account: &str) -> Result<Self> {
        let entry = Entry::new(service, account).map_err(|err| CadenceError::from(InfraError::from(err)))?;
        Ok(Self { entry: Arc::new(entry) })
    }
}

#[async_trait]
impl TokenStore for KeychainTokenStore {
    async fn credentials(&self) -> Result<Option<AuthSession>> {
        let entry = Arc::clone(&self.entry);
        let raw = task::spawn_blocking(move || entry.get_password())
            .await
            .map_err(|err| CadenceError::Internal(format!("keychain task failed: {err}")))?;

        match raw {
            Ok(json) => match serde_json::from_str::<AuthSession>(&json) {
                Ok(session) => Ok(Some(session)),
                Err(err) => {
                    warn!(error = %err, "discarding unreadable keychain credential");
                    Ok(None)
                }
            },
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }

    async fn save(&self, session: &AuthSession) -> Result<()> {
        let json = serde_json::to_string(session)
            .map_err(|err| CadenceError::Internal(format!("failed to encode credential: {err}")))?;
        let entry = Arc::clone(&self.entry);
        task::spawn_blocking(move || entry.set_password(&json))
            .await
            .map_err(|err| CadenceError::Internal(format!("keychain task failed: {err}")))?
            .map_err(|err| CadenceError::from(InfraError::from(err)))?;
        debug!(user_id = %session.user_id, "credential stored in keychain");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let entry = Arc::clone(&self.entry);
        let outcome = task::spawn_blocking(move || entry.delete_credential())
            .await
            .map_err(|err| CadenceError::Internal(format!("keychain task failed: {err}")))?;

        match outcome {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}
