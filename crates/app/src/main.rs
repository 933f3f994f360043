//! Cadence - interval timer with optional remote sync.
//!
//! Command-line entry point.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use cadence_app::commands::{self, account, sessions};
use cadence_app::utils::init_logging;
use cadence_app::AppContext;
use cadence_core::ChannelSink;
use cadence_domain::TimerConfig;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "cadence", version, about = "Activity/rest interval timer with optional sync")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the timer until interrupted with Ctrl-C
    Run {
        /// Activity phase length in minutes
        #[arg(long)]
        activity: Option<u32>,
        /// Rest phase length in minutes
        #[arg(long)]
        rest: Option<u32>,
    },
    /// List recent local sessions
    History {
        #[arg(long, default_value_t = sessions::DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
    /// Show local and remote statistics
    Stats,
    /// Push unsynced sessions to the remote backend
    Sync,
    /// Log in to the remote backend
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create a remote account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
    },
    /// Forget the stored credential
    Logout,
    /// Show the cycle leaderboard
    Leaderboard {
        #[arg(long, default_value_t = account::DEFAULT_LEADERBOARD_LIMIT)]
        limit: usize,
    },
    /// Check that the remote backend is reachable
    Ping,
    /// Inspect or change persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
    /// Turn remote sync on or off
    Sync {
        #[arg(value_parser = parse_toggle)]
        enabled: bool,
    },
    /// Select the remote backend used from the next start
    Backend {
        #[arg(value_enum)]
        mode: BackendMode,
    },
    /// Set the live backend base URL
    BaseUrl { url: String },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum BackendMode {
    Stub,
    Live,
}

fn parse_toggle(value: &str) -> std::result::Result<bool, String> {
    match value {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(format!("expected `on` or `off`, got `{other}`")),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => info!(error = %err, "no .env file loaded"),
    }

    let cli = Cli::parse();
    let ctx = Arc::new(AppContext::new().await.context("failed to initialize application")?);

    let outcome = dispatch(&ctx, cli.command).await;
    if let Err(err) = ctx.shutdown().await {
        warn!(error = %err, "shutdown did not complete cleanly");
    }
    outcome
}

async fn dispatch(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Run { activity, rest } => run_timer(ctx, activity, rest).await?,
        Command::History { limit } => print_json(&commands::history(ctx, limit).await?)?,
        Command::Stats => print_json(&commands::stats(ctx).await?)?,
        Command::Sync => {
            let accepted = commands::sync(ctx).await?;
            println!("{accepted} session(s) synced");
        }
        Command::Login { email, password } => {
            let session = commands::login(ctx, &email, &password).await?;
            println!("logged in as {}", session.email);
        }
        Command::Register { email, password, name } => {
            let session = commands::register(ctx, &email, &password, &name).await?;
            println!("registered {}", session.email);
        }
        Command::Logout => {
            commands::logout(ctx).await?;
            println!("logged out");
        }
        Command::Leaderboard { limit } => print_json(&commands::leaderboard(ctx, limit).await?)?,
        Command::Ping => {
            let reachable = commands::ping(ctx).await?;
            println!("{} backend {}", ctx.remote.backend_name(), if reachable { "reachable" } else { "unreachable" });
        }
        Command::Settings { action } => settings(ctx, action).await?,
    }
    Ok(())
}

async fn settings(ctx: &AppContext, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let current = commands::show_settings(ctx).await?;
            println!("sync_enabled = {}", current.sync_enabled);
            println!("backend      = {}", if current.use_stub { "stub" } else { "live" });
            println!("base_url     = {}", current.base_url);
        }
        SettingsAction::Sync { enabled } => commands::set_sync(ctx, enabled).await?,
        SettingsAction::Backend { mode } => {
            commands::set_use_stub(ctx, matches!(mode, BackendMode::Stub)).await?;
            println!("backend change applies on next start");
        }
        SettingsAction::BaseUrl { url } => commands::set_api_base_url(ctx, &url).await?,
    }
    Ok(())
}

async fn run_timer(ctx: &AppContext, activity: Option<u32>, rest: Option<u32>) -> Result<()> {
    let defaults = ctx.default_timer_config()?;
    let config = TimerConfig::new(
        activity.unwrap_or(defaults.activity_minutes),
        rest.unwrap_or(defaults.rest_minutes),
    )?;

    let (sink, mut events) = ChannelSink::channel();
    ctx.scheduler.subscribe(Arc::new(sink));

    let (handle, session_id) = ctx.start_timer(Some(config)).await?;
    info!(run_id = %handle.run_id, session_id, "timer running; press Ctrl-C to stop");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                break;
            }
            Some(event) = events.recv() => println!("{}", serde_json::to_string(&event)?),
        }
    }

    if let Some(summary) = ctx.stop_timer(true).await? {
        println!("run ended after {} cycle(s)", summary.total_cycles);
    }
    Ok(())
}
