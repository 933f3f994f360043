//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use cadence_core::{
    IntervalTimer, LoggingSink, PhaseScheduler, RemoteSettings, RemoteSyncClient, RunHandle,
    RunSummary, SettingsPort, SyncRepository, TokenStore,
};
use cadence_domain::{CadenceError, Config, Result, TimerConfig};
use cadence_infra::{
    build_remote_client, DbManager, KeychainTokenStore, MemoryTokenStore, SchedulerError,
    SqliteSessionStore, SqliteSettingsRepository, TimerDriver, TimerDriverConfig,
};
use tracing::{info, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub settings: Arc<dyn SettingsPort>,
    pub token_store: Arc<dyn TokenStore>,
    pub remote: Arc<dyn RemoteSyncClient>,
    pub repository: Arc<SyncRepository>,
    pub scheduler: Arc<PhaseScheduler>,
    pub timer: Arc<IntervalTimer>,
    pub driver: Arc<TimerDriver>,
}

impl AppContext {
    /// Build the context from the configuration found by the loader.
    pub async fn new() -> Result<Self> {
        let config = cadence_infra::config::load()?;
        Self::new_with_config(config).await
    }

    /// Build the context from an explicit configuration.
    ///
    /// Stub mode keeps credentials in memory; live mode stores them in the OS
    /// keychain.
    pub async fn new_with_config(config: Config) -> Result<Self> {
        let db = Arc::new(open_database(&config)?);
        let settings: Arc<dyn SettingsPort> =
            Arc::new(SqliteSettingsRepository::new(Arc::clone(&db)));
        let remote_settings = settings.remote_settings().await?;

        let token_store: Arc<dyn TokenStore> = if remote_settings.use_stub {
            Arc::new(MemoryTokenStore::new())
        } else {
            Arc::new(KeychainTokenStore::new()?)
        };

        Self::assemble(config, db, settings, remote_settings, token_store)
    }

    /// Build the context with a caller-supplied token store.
    pub async fn new_with_token_store(
        config: Config,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let db = Arc::new(open_database(&config)?);
        let settings: Arc<dyn SettingsPort> =
            Arc::new(SqliteSettingsRepository::new(Arc::clone(&db)));
        let remote_settings = settings.remote_settings().await?;
        Self::assemble(config, db, settings, remote_settings, token_store)
    }

    fn assemble(
        config: Config,
        db: Arc<DbManager>,
        settings: Arc<dyn SettingsPort>,
        remote_settings: RemoteSettings,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let remote = build_remote_client(&remote_settings, &config.remote, Arc::clone(&token_store))?;

        let store = Arc::new(SqliteSessionStore::new(Arc::clone(&db)));
        let repository = Arc::new(
            SyncRepository::new(store, Arc::clone(&remote), remote_settings.sync_enabled)
                .with_remote_timeout(Duration::from_secs(config.remote.sync_timeout_secs.max(1))),
        );

        let scheduler = Arc::new(PhaseScheduler::new());
        scheduler.subscribe(Arc::new(LoggingSink));

        let timer = Arc::new(IntervalTimer::new(Arc::clone(&scheduler), Arc::clone(&repository)));
        let driver = Arc::new(TimerDriver::new(
            Arc::clone(&scheduler),
            TimerDriverConfig {
                tick_interval: Duration::from_millis(config.timer.tick_interval_ms.max(1)),
                ..TimerDriverConfig::default()
            },
        ));

        info!(
            db_path = %db.path().display(),
            backend = remote.backend_name(),
            sync_enabled = remote_settings.sync_enabled,
            "application context ready"
        );

        Ok(Self { config, db, settings, token_store, remote, repository, scheduler, timer, driver })
    }

    /// Timer configuration from the configured defaults.
    pub fn default_timer_config(&self) -> Result<TimerConfig> {
        TimerConfig::new(self.config.timer.activity_minutes, self.config.timer.rest_minutes)
    }

    /// Start a run and its tick source. Returns the run handle and the id of
    /// the session recording it.
    pub async fn start_timer(&self, config: Option<TimerConfig>) -> Result<(RunHandle, i64)> {
        let config = match config {
            Some(config) => config,
            None => self.default_timer_config()?,
        };

        let started = self.timer.start(config).await?;
        if let Err(err) = self.driver.start().await {
            warn!(error = %err, "tick driver failed to start; ending run");
            self.timer.stop(false).await?;
            return Err(err.into());
        }
        Ok(started)
    }

    /// Stop the tick source and close the active session.
    pub async fn stop_timer(&self, manually_ended: bool) -> Result<Option<RunSummary>> {
        self.stop_driver().await?;
        self.timer.stop(manually_ended).await
    }

    /// Persist the sync setting and apply it to the running repository.
    pub async fn set_sync_enabled(&self, enabled: bool) -> Result<()> {
        self.settings.set_sync_enabled(enabled).await?;
        self.repository.set_sync_enabled(enabled);
        Ok(())
    }

    /// End any active run programmatically, stop background ticking and give
    /// queued pushes up to the sync timeout to finish.
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(summary) = self.stop_timer(false).await? {
            info!(run_id = %summary.run_id, total_cycles = summary.total_cycles, "active run closed at shutdown");
        }
        let abandoned = self.repository.drain_pushes(self.sync_timeout()).await;
        info!(abandoned_pushes = abandoned, "application context shut down");
        Ok(())
    }

    fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.config.remote.sync_timeout_secs.max(1))
    }

    async fn stop_driver(&self) -> Result<()> {
        match self.driver.stop().await {
            Ok(()) | Err(SchedulerError::NotRunning) => Ok(()),
            Err(err) => Err(CadenceError::from(err)),
        }
    }
}

fn open_database(config: &Config) -> Result<DbManager> {
    DbManager::open(&config.database).map_err(|err| {
        tracing::error!(error = %err, path = %config.database.path, "failed to open database");
        err
    })
}
