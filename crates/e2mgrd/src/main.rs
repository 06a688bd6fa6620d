//! e2mgrd — the E2 manager daemon.
//!
//! Loads `e2mgr.toml`, opens the state store, connects the lifecycle
//! managers to the routing manager and the message bus, and runs until
//! interrupted.
//!
//! Keep-alive responses from E2T instances reach the pool only through
//! `E2tInstancesManager::reset_keep_alive`, which an inbound transport must
//! call. This process has no such transport, so the keep-alive worker runs
//! only when `keep_alive.enabled` is set; without responses it would shut
//! every instance down one response timeout after startup.
//!
//! # Usage
//!
//! ```text
//! e2mgrd run --config /etc/e2mgr/e2mgr.toml
//! e2mgrd default-config > e2mgr.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use e2mgr_core::{ChannelSender, Config, Message, MessageSender};
use e2mgr_managers::{
    E2tAssociationManager, E2tInstancesManager, E2tKeepAliveWorker, E2tShutdownManager,
};
use e2mgr_routing::{HttpRoutingClient, RoutingClient};
use e2mgr_state::{StateGateway, StateStore};

#[derive(Parser)]
#[command(name = "e2mgrd", about = "E2 manager daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the manager.
    Run {
        /// Path to e2mgr.toml. Built-in defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration as TOML.
    DefaultConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { config } => {
            let config = match config {
                Some(path) => Config::from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => Config::default(),
            };
            init_tracing(&config);
            run(config).await
        }
        Command::DefaultConfig => {
            print!("{}", Config::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!("e2 manager starting");

    // ── Collaborators ──────────────────────────────────────────

    if let Some(dir) = config.state.path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating state directory {}", dir.display()))?;
    }
    let store = StateStore::open(&config.state.path)?;
    info!(path = ?config.state.path, "state store opened");
    let state: Arc<dyn StateGateway> = Arc::new(store);

    let routing: Arc<dyn RoutingClient> = Arc::new(HttpRoutingClient::new(
        &config.routing_manager.base_url,
        config.routing_timeout()?,
    )?);
    info!(base_url = %config.routing_manager.base_url, "routing client ready");

    let (sender, bus) = ChannelSender::new();
    let sender: Arc<dyn MessageSender> = Arc::new(sender);

    // ── Managers ───────────────────────────────────────────────

    let instances = Arc::new(E2tInstancesManager::new(state.clone()));
    let association = Arc::new(E2tAssociationManager::new(
        state.clone(),
        instances.clone(),
        routing,
    ));
    let shutdown = Arc::new(E2tShutdownManager::new(
        state,
        instances.clone(),
        association,
        config.e2t_deletion_timeout()?,
    ));
    let worker = E2tKeepAliveWorker::new(
        instances.clone(),
        shutdown,
        sender,
        config.keep_alive_delay()?,
        config.keep_alive_response_timeout()?,
    );

    // Time spent down must not count against the instances.
    instances.reset_keep_alive_for_all().await;

    // ── Background tasks ───────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let bus_handle = tokio::spawn(drain_bus(bus, shutdown_rx.clone()));
    let worker_handle = if config.keep_alive.enabled {
        Some(tokio::spawn(async move {
            worker.run(shutdown_rx).await;
        }))
    } else {
        warn!("keep-alive worker disabled, e2t instances will not be health checked");
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("installing ctrl-c handler")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    if let Some(handle) = worker_handle {
        let _ = handle.await;
    }
    let _ = bus_handle.await;

    info!("e2 manager stopped");
    Ok(())
}

/// Consume outbound messages until shutdown.
///
/// The transport toward the E2T instances is external; messages are only
/// traced here.
async fn drain_bus(mut bus: mpsc::UnboundedReceiver<Message>, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            message = bus.recv() => match message {
                Some(message) => debug!(
                    msg_type = message.msg_type,
                    ran_name = %message.ran_name,
                    payload_len = message.payload.len(),
                    "outbound message"
                ),
                None => break,
            },
            _ = shutdown.changed() => break,
        }
    }
}
