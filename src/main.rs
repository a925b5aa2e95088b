#![forbid(unsafe_code)]

//! `cache-intercom` — Slack bot that purges CDN caches on confirmed commands.
//!
//! Bootstraps configuration, connects to Slack over Socket Mode, resolves
//! the startup roster, then runs the command consumer and the batch
//! dispatcher until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use slack_morphism::prelude::SlackChannelId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use cache_intercom::command::CommandParser;
use cache_intercom::config::GlobalConfig;
use cache_intercom::dispatch::{handoff, spawn_dispatcher, BatchDispatcher};
use cache_intercom::handler::{spawn_command_consumer, CommandHandler};
use cache_intercom::purge::cloudflare::CloudflareClient;
use cache_intercom::slack::client::{SlackMessage, SlackService};
use cache_intercom::slack::messages;
use cache_intercom::slack::roster::AccessPolicy;
use cache_intercom::slack::ChatChannel;
use cache_intercom::{AppError, Result};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "cache-intercom", about = "Slack-driven CDN cache purging", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("cache-intercom bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!(
        zone = %config.cdn.zone_id,
        trigger = %config.trigger_phrase,
        bases = config.url_bases.len(),
        suffixes = config.url_suffixes.len(),
        "configuration loaded"
    );

    // ── Connect to Slack ────────────────────────────────
    let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
    let (slack, _slack_runtime) = SlackService::start(&config.slack, events_tx)
        .await
        .map_err(|err| {
            error!(%err, "slack service start failed");
            err
        })?;
    let slack = Arc::new(slack);

    let roster = slack.fetch_roster().await?;
    let access = AccessPolicy::resolve(&config, &roster);
    info!(bot_user_id = %roster.bot_user_id, "slack roster resolved");

    if config.announce_on_startup {
        for channel in &roster.channels {
            let msg = SlackMessage::plain(SlackChannelId(channel.id.clone()), messages::READY);
            if let Err(err) = slack.enqueue(msg).await {
                error!(%err, channel = %channel.name, "failed to post ready message");
            }
        }
    }

    // ── Wire dispatcher and command consumer ────────────
    let executor = Arc::new(CloudflareClient::new(&config.cdn)?);
    info!(endpoint = executor.purge_url(), "purge executor ready");
    let chat: Arc<dyn ChatChannel> = slack.clone();

    let ct = CancellationToken::new();
    let (dispatch, jobs_rx) = handoff(config.dispatch.queue_capacity);
    let dispatcher =
        BatchDispatcher::new(config.dispatch.buffer_capacity, executor, Arc::clone(&chat));
    let dispatcher_handle = spawn_dispatcher(
        dispatcher,
        jobs_rx,
        config.dispatch.flush_interval(),
        ct.clone(),
    );

    let handler = CommandHandler::new(
        CommandParser::from_config(&config)?,
        access,
        roster.bot_user_id.clone(),
        dispatch,
        chat,
    );
    let consumer_handle = spawn_command_consumer(handler, events_rx, ct.clone());

    info!("cache-intercom ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = tokio::join!(dispatcher_handle, consumer_handle);
    info!("cache-intercom shut down");

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
