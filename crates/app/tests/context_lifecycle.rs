//! Integration tests for AppContext lifecycle
//!
//! The context is built against a temporary encrypted database with the
//! default (stub) backend, so no keychain or network access is needed.

use std::path::Path;
use std::time::Duration;

use cadence_app::commands;
use cadence_app::AppContext;
use cadence_domain::{
    CadenceError, Config, DatabaseConfig, Phase, RemoteConfig, TimerConfig, TimerDefaults,
};
use tempfile::TempDir;

const TEST_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn test_config(dir: &Path) -> Config {
    Config {
        database: DatabaseConfig {
            path: dir.join("cadence.db").to_string_lossy().to_string(),
            pool_size: 4,
            encryption_key: Some(TEST_KEY.to_string()),
        },
        remote: RemoteConfig { stub_latency_min_ms: 0, stub_latency_max_ms: 0, ..RemoteConfig::default() },
        // Fast ticks so runs make visible progress within a test.
        timer: TimerDefaults { tick_interval_ms: 5, ..TimerDefaults::default() },
    }
}

async fn create_test_context() -> (AppContext, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temporary test directory");
    let ctx = AppContext::new_with_config(test_config(temp_dir.path()))
        .await
        .expect("context should build");
    (ctx, temp_dir)
}

fn shortest_config() -> TimerConfig {
    TimerConfig::new(10, 5).expect("valid config")
}

#[tokio::test(flavor = "multi_thread")]
async fn context_defaults_to_stub_backend_with_sync_off() {
    let (ctx, _temp_dir) = create_test_context().await;

    assert_eq!(ctx.remote.backend_name(), "stub");
    assert!(!ctx.repository.is_sync_enabled());
    assert!(!ctx.token_store.is_logged_in().await.unwrap());
    assert!(ctx.db.is_encrypted());
    assert!(!ctx.scheduler.is_running());
}

#[tokio::test(flavor = "multi_thread")]
async fn start_and_manual_stop_record_a_session() {
    let (ctx, _temp_dir) = create_test_context().await;

    let (handle, session_id) = ctx.start_timer(Some(shortest_config())).await.unwrap();
    assert_eq!(handle.config, shortest_config());
    assert_eq!(ctx.timer.current_session().await, Some(session_id));
    assert!(ctx.driver.is_running());

    let summary = ctx.stop_timer(true).await.unwrap().expect("run was active");
    assert_eq!(summary.run_id, handle.run_id);
    assert!(summary.manually_ended);
    assert!(!ctx.driver.is_running());

    let session = ctx.repository.session(session_id).await.unwrap().expect("session stored");
    assert!(session.end_time.is_some());
    assert!(session.manually_ended);
    assert_eq!(session.activity_minutes, 10);
    assert_eq!(session.rest_minutes, 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn driver_ticks_the_active_run() {
    let (ctx, _temp_dir) = create_test_context().await;
    ctx.start_timer(Some(shortest_config())).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    let snapshot = ctx.scheduler.snapshot();
    assert_eq!(snapshot.phase, Phase::Activity);
    assert!(snapshot.remaining_seconds < 600, "remaining {}", snapshot.remaining_seconds);

    ctx.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn second_start_is_rejected_while_running() {
    let (ctx, _temp_dir) = create_test_context().await;

    ctx.start_timer(None).await.unwrap();
    let err = ctx.start_timer(Some(shortest_config())).await.unwrap_err();
    assert!(matches!(err, CadenceError::InvalidConfig(_)));

    ctx.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_without_run_is_a_no_op() {
    let (ctx, _temp_dir) = create_test_context().await;
    assert!(ctx.stop_timer(true).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_setting_persists_across_restarts() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    let first = AppContext::new_with_config(config.clone()).await.unwrap();
    first.set_sync_enabled(true).await.unwrap();
    assert!(first.repository.is_sync_enabled());
    first.shutdown().await.unwrap();
    drop(first);

    let second = AppContext::new_with_config(config).await.unwrap();
    assert!(second.repository.is_sync_enabled());
    assert!(commands::show_settings(&second).await.unwrap().sync_enabled);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_closes_active_run_and_is_idempotent() {
    let (ctx, _temp_dir) = create_test_context().await;
    let (_, session_id) = ctx.start_timer(Some(shortest_config())).await.unwrap();

    ctx.shutdown().await.unwrap();
    ctx.shutdown().await.unwrap();

    let session = ctx.repository.session(session_id).await.unwrap().unwrap();
    assert!(session.end_time.is_some());
    assert!(!session.manually_ended);
    assert!(!ctx.scheduler.is_running());
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_waits_for_final_push() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path());
    config.remote.stub_latency_min_ms = 150;
    config.remote.stub_latency_max_ms = 250;

    let ctx = AppContext::new_with_config(config).await.unwrap();
    ctx.set_sync_enabled(true).await.unwrap();
    let mut outcomes = ctx.repository.push_outcomes();

    let (_, session_id) = ctx.start_timer(Some(shortest_config())).await.unwrap();
    ctx.stop_timer(true).await.unwrap();
    ctx.shutdown().await.unwrap();

    assert_eq!(ctx.repository.pending_pushes(), 0);
    let session = ctx.repository.session(session_id).await.unwrap().unwrap();
    assert!(session.synced, "final state pushed before shutdown returned");
    assert!(outcomes.try_recv().is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn commands_report_local_history_and_stats() {
    let (ctx, _temp_dir) = create_test_context().await;
    for _ in 0..2 {
        ctx.start_timer(Some(shortest_config())).await.unwrap();
        ctx.stop_timer(true).await.unwrap();
    }

    let history = commands::history(&ctx, 1).await.unwrap();
    assert_eq!(history.len(), 1);

    let stats = commands::stats(&ctx).await.unwrap();
    assert_eq!(stats.local_sessions, 2);
    assert!(stats.remote.is_none());

    assert_eq!(commands::sync(&ctx).await.unwrap_err(), CadenceError::SyncDisabled);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_base_url_is_rejected() {
    let (ctx, _temp_dir) = create_test_context().await;
    let err = commands::set_api_base_url(&ctx, "ftp://example.com").await.unwrap_err();
    assert!(matches!(err, CadenceError::InvalidConfig(_)));
}
