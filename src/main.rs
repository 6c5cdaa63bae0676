//! CORS Forwarding Gateway
//!
//! Forwards browser requests to the target named in the `url` query
//! parameter and relays the answer with permissive CORS headers.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ origin policy ──▶ gateway handler ──▶ target resolver
//!                                        │
//!                                        ▼
//!     Client ◀── CORS headers ◀── response handler ◀── upstream client ◀──▶ Target
//!                                  (redirect loop)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cors_gateway::config::{load_config, validation::overlapping_origins};
use cors_gateway::lifecycle::{signals::wait_for_shutdown_signal, Shutdown};
use cors_gateway::net::tls::load_tls_config;
use cors_gateway::observability::{logging::init_logging, metrics::init_metrics};
use cors_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "cors-gateway")]
#[command(version, about = "CORS forwarding gateway", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the log level (ignored when RUST_LOG is set)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    init_logging(&config.observability.log_level);

    tracing::info!("cors-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        max_redirects = config.policy.max_redirects,
        whitelist = config.policy.origin_whitelist.len(),
        blacklist = config.policy.origin_blacklist.len(),
        "Configuration loaded"
    );
    for origin in overlapping_origins(&config) {
        tracing::warn!(origin = %origin, "Origin is in both lists; it will be blocked");
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr);
    }

    let shutdown = Shutdown::new();
    let server_rx = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("Shutdown signal received, draining connections");
        shutdown.trigger();
    });

    let addr: SocketAddr = config.listener.bind_address.parse()?;
    let tls = config.listener.tls.clone();
    let server = HttpServer::new(config)?;

    match tls {
        Some(tls) => {
            let rustls = load_tls_config(&tls).await?;
            server.run_tls(addr, rustls, server_rx).await?;
        }
        None => {
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, server_rx).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
