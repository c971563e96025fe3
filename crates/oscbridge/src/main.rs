//! Binary entrypoint for the oscbridge daemon.
//!
//! Wires together the engine, the UDP listener task, and the interactive
//! command loop. The listener and the command loop both talk to the same
//! [`Engine`], which serializes access to the filter table.

use std::{path::PathBuf, process};

use clap::Parser;
use oscbridge_engine::Engine;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Background UDP receive loop.
mod listener;
/// Interactive command loop.
mod repl;

/// Default UDP port for inbound parameter messages.
const DEFAULT_PORT: u16 = 9001;

#[derive(Parser, Debug)]
#[command(
    name = "oscbridge",
    about = "Bridge OSC parameter telemetry to desktop automation",
    version
)]
/// Command-line interface for the `oscbridge` binary.
struct Cli {
    /// UDP port to listen on for inbound messages
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Optional path to the config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Run without the interactive command loop
    #[arg(long)]
    listen_only: bool,

    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(oscbridge_config::DEFAULT_CONFIG_FILE));
    let engine = Engine::new(config_path);

    match engine.load().await {
        Ok(Some(n)) => info!(filters = n, "loaded configuration"),
        Ok(None) => {
            // First run: seed and persist the default filter set before the
            // session starts.
            match engine.install_default_filters().await {
                Ok(n) => info!(filters = n, "no config file found, installed default filters"),
                Err(e) => warn!(error = %e, "failed to install default filters"),
            }
        }
        Err(e) => warn!(error = %e, "failed to load configuration"),
    }

    // Seed the media state cache.
    engine.media().refresh_state().await;

    let socket = match UdpSocket::bind(("0.0.0.0", cli.port)).await {
        Ok(socket) => socket,
        Err(e) => {
            error!(port = cli.port, error = %e, "failed to bind listen socket");
            process::exit(1);
        }
    };
    info!(port = cli.port, "listening for inbound messages");

    let cancel = CancellationToken::new();
    let listener = tokio::spawn(listener::run(socket, engine.clone(), cancel.clone()));

    if cli.listen_only {
        println!("Running in listen-only mode. Press ctrl-c to stop.");
        let _ = tokio::signal::ctrl_c().await;
    } else {
        tokio::select! {
            _ = repl::run(engine.clone()) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }

    cancel.cancel();
    let _ = listener.await;
    if let Err(e) = engine.save().await {
        warn!(error = %e, "failed to persist configuration on shutdown");
    }
    info!("shutdown complete");
}
