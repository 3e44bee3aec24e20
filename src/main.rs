//! chatrelay - a multi-room chat relay server.
//!
//! Terminates WebSocket connections, dispatches JSON action frames to a
//! fixed set of handlers, and fans room messages out through per-room and
//! per-client bounded queues. See SPEC_FULL.md for the full design.

mod config;
mod dispatch;
mod error;
mod handlers;
mod network;
mod state;
mod wire;

use crate::config::Config;
use crate::network::Gateway;
use crate::state::Registry;
use std::path::Path;
use tracing::{error, info};

/// Resolve the configuration path from CLI arguments.
/// Supports `-c <path>`, `--config <path>`, or a bare path.
/// Falls back to `config.toml` when no argument is provided.
fn resolve_config_path() -> String {
    let mut args = std::env::args().skip(1);

    match args.next() {
        Some(flag) if flag == "-c" || flag == "--config" => args.next().unwrap_or_else(|| {
            eprintln!("Missing path after {}", flag);
            std::process::exit(1);
        }),
        Some(path) => path,
        None => "config.toml".to_string(),
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if !Path::new(path).exists() {
        return Ok(Config::default());
    }
    Config::load(path).map_err(|e| {
        eprintln!("ERROR: failed to load config from {}: {}", path, e);
        e.into()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = resolve_config_path();
    let config = load_config(&config_path)?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match config.server.log_format {
        config::LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .json()
                .init();
        }
        config::LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .init();
        }
    }

    if let Err(errors) = config::validate(&config) {
        for err in &errors {
            error!(error = %err, "configuration validation failed");
        }
        return Err(anyhow::anyhow!(
            "configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    info!(
        listen = %config.server.listen,
        outbound_queue_capacity = config.server.outbound_queue_capacity,
        max_frame_bytes = config.server.max_frame_bytes,
        "starting chatrelay"
    );

    // `validate()` above already confirmed `listen` parses.
    let listen_addr = config.server.listen_addr().expect("validated listen address");

    let registry = Registry::new(config.server.outbound_queue_capacity);
    let gateway = Gateway::bind(listen_addr, registry, config.server.max_frame_bytes).await?;

    tokio::select! {
        result = gateway.run() => {
            if let Err(e) = result {
                error!(error = %e, "gateway exited with error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
    }

    Ok(())
}
