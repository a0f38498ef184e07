//! luc-server: LUC relay server.
//!
//! Listens on a single TCP port, gates clients through a fixed number of
//! slots, and relays end-to-end encrypted text and file payloads between
//! connected identities.

use clap::Parser;
use luc_server::config::{default_config_path, ServerConfig};
use luc_server::RelayServer;
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::{error, info};

/// luc-server: LUC relay server
#[derive(Parser, Debug)]
#[command(name = "luc-server", version, about = "LUC relay server")]
struct Cli {
    /// Listen address
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Maximum concurrently active clients
    #[arg(long)]
    max_clients: Option<usize>,

    /// Milliseconds between WAIT notifications to queued clients
    #[arg(long)]
    wait_interval_ms: Option<u64>,

    /// Config file path (default: ~/.luc/server.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    use tracing_subscriber::EnvFilter;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting luc-server");

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let server_config = match ServerConfig::load(
        Some(&config_path),
        cli.bind,
        cli.port,
        cli.max_clients,
        cli.wait_interval_ms,
    ) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let server = match RelayServer::bind(&server_config).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            info!("received shutdown signal");
        }
    }

    info!("luc-server stopped");
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "failed to install SIGTERM handler, only Ctrl+C will stop the server"
                );
                ctrl_c.await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
