#![forbid(unsafe_code)]

//! `backdrop-bot`: background replacement chat bot binary.
//!
//! Bootstraps configuration and credentials, builds the bot core, and
//! connects it to Slack over Socket Mode until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use backdrop_bot::config::GlobalConfig;
use backdrop_bot::monitor;
use backdrop_bot::slack::client::SlackService;
use backdrop_bot::{AppError, BackdropBot, Result};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "backdrop-bot", about = "Background replacement chat bot", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the preset templates directory.
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Override the uploaded backgrounds directory.
    #[arg(long)]
    backgrounds: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("backdrop-bot bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(templates) = args.templates {
        config.templates_root = templates;
    }
    if let Some(backgrounds) = args.backgrounds {
        config.background_root = backgrounds;
    }
    if !config.templates_root.is_dir() {
        warn!(
            path = %config.templates_root.display(),
            "templates directory missing; template previews will be skipped"
        );
    }

    config.load_credentials().await?;
    let config = Arc::new(config);
    info!(
        colors = config.colors.len(),
        templates = config.templates.len(),
        max_concurrent_jobs = config.max_concurrent_jobs,
        "configuration loaded"
    );

    // ── Build the bot core ──────────────────────────────
    let bot = Arc::new(BackdropBot::from_config(&config)?);
    info!(background_root = %bot.storage().root().display(), "bot core ready");

    let ct = CancellationToken::new();
    let usage_handle =
        monitor::spawn_usage_task(Arc::clone(&bot), monitor::REPORT_INTERVAL, ct.clone());

    // ── Connect to Slack ────────────────────────────────
    let (slack, runtime) = SlackService::start(Arc::clone(&config), Arc::clone(&bot))
        .map_err(|err| {
            error!(%err, "slack service start failed");
            err
        })?;
    info!("backdrop-bot ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();
    slack.shutdown(runtime, DRAIN_TIMEOUT).await;
    let _ = usage_handle.await;
    info!("backdrop-bot shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
