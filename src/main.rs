//! Telemon CLI entry point.
//!
//! Provides `start`, `check`, and `validate` subcommands for running the
//! monitor with its Telegram bot, performing a single poll round, or
//! checking the configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use teloxide::Bot;
use tokio::sync::watch;
use tracing::{info, warn};

use telemon::config::{config_path, load_config, Config};
use telemon::credentials::load_optional_credentials;
use telemon::dispatch::CommandDispatcher;
use telemon::fleet::FleetState;
use telemon::logging;
use telemon::notify::LogSink;
use telemon::poller::HealthPoller;
use telemon::profit::{HttpPriceSource, Profitability};
use telemon::rig::RigRegistry;
use telemon::telegram::{self, parse_recipient, TelegramNotifier};

/// Telemon: mining rig fleet monitor with a Telegram bot.
#[derive(Parser)]
#[command(name = "telemon", version, about)]
struct Cli {
    /// Path to the TOML config (default: $TELEMON_CONFIG_PATH or ./telemon.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Optional `.env` file holding the bot token (must be mode 0600).
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the poller and the Telegram bot until Ctrl+C.
    Start {
        /// Directory for rotated JSON logs.
        #[arg(long, default_value = "logs")]
        logs_dir: PathBuf,
    },
    /// Poll every rig once, log snapshots and alerts, and exit.
    Check,
    /// Load and validate the configuration, then print the rig list.
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let path = config_path(cli.config.as_deref());

    match cli.command {
        Command::Start { logs_dir } => {
            handle_start(&path, cli.env_file.as_deref(), &logs_dir).await
        }
        Command::Check => handle_check(&path).await,
        Command::Validate => handle_validate(&path),
    }
}

/// Run the monitor daemon.
async fn handle_start(
    config_path: &Path,
    env_file: Option<&Path>,
    logs_dir: &Path,
) -> anyhow::Result<()> {
    let _logging_guard = logging::init_production(logs_dir)?;

    let config = load_config(config_path)?;
    let credentials = load_optional_credentials(env_file)?;
    let bot_token = credentials
        .resolve(&config.telegram.bot_token_env)
        .with_context(|| {
            format!(
                "bot token not found in ${}",
                config.telegram.bot_token_env
            )
        })?;

    let registry = Arc::new(RigRegistry::from_configs(
        &config.rigs,
        config.poll.timeout(),
    )?);
    let fleet = Arc::new(FleetState::new());
    let bot = Bot::new(bot_token);

    let notifier = Arc::new(TelegramNotifier::new(
        bot.clone(),
        parse_recipient(&config.telegram.notify_chat),
        config.telegram.alert_cooldown_mins,
    ));
    let poller = HealthPoller::new(
        Arc::clone(&registry),
        Arc::clone(&fleet),
        notifier,
        config.poll.interval(),
    );

    let profit = Arc::new(build_profitability(&config)?);
    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::clone(&registry),
        Arc::clone(&fleet),
        profit,
    ));

    info!(
        config = %config_path.display(),
        rigs = registry.len(),
        interval_secs = config.poll.interval_secs,
        "telemon started"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_handle = tokio::spawn(poller.run(shutdown_rx));

    let bot_result =
        telegram::run_telegram(bot, dispatcher, config.telegram.allowed_users.clone()).await;

    if shutdown_tx.send(true).is_err() {
        warn!("health poller already stopped");
    }
    if let Err(e) = poller_handle.await {
        warn!(error = %e, "health poller task failed");
    }

    info!("telemon stopped");
    bot_result
}

/// Poll every rig once and log the result.
async fn handle_check(config_path: &Path) -> anyhow::Result<()> {
    logging::init_cli();

    let config = load_config(config_path)?;
    let registry = Arc::new(RigRegistry::from_configs(
        &config.rigs,
        config.poll.timeout(),
    )?);
    let poller = HealthPoller::new(
        Arc::clone(&registry),
        Arc::new(FleetState::new()),
        Arc::new(LogSink),
        config.poll.interval(),
    );

    let report = poller.poll_round().await;
    for entry in registry.iter() {
        if let Some(snapshot) = report.view.rig(entry.name()) {
            info!(
                rig = %snapshot.name,
                status = %snapshot.status,
                gpus = snapshot.active_gpu_count(),
                uptime_mins = snapshot.uptime_mins,
                hash_rate = snapshot.main_session.hash_rate,
                "rig checked"
            );
        }
    }
    info!(alerts = report.alerts.len(), "check complete");
    Ok(())
}

/// Validate the configuration and print the rig list.
fn handle_validate(config_path: &Path) -> anyhow::Result<()> {
    logging::init_cli();

    let config = load_config(config_path)?;
    println!("config OK: {}", config_path.display());
    println!(
        "poll every {}s (timeout {}s), currency {} ({})",
        config.poll.interval_secs,
        config.poll.timeout_secs,
        config.currency.code,
        config.currency.symbol
    );
    for rig in &config.rigs {
        println!(
            "  {name}  {address}  {coin} ({tag}){dual}",
            name = rig.name,
            address = rig.address(),
            coin = rig.coin_name,
            tag = rig.coin_tag,
            dual = if rig.dual { "  dual" } else { "" },
        );
    }
    Ok(())
}

fn build_profitability(config: &Config) -> anyhow::Result<Profitability> {
    let source = HttpPriceSource::with_defaults(config.poll.timeout())
        .context("failed to build price client")?;
    Ok(Profitability::new(
        Arc::new(source),
        config.currency.code.clone(),
        config.currency.symbol.clone(),
    ))
}
