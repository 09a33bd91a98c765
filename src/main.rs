//! TG Proxy Server
//!
//! ```text
//!                         ┌──────────────────────────────────────────┐
//!   GET /tg/s/{path}?q    │               TG PROXY                   │
//!   ──────────────────────┼─▶ axum router ─▶ Forwarder ─────────────┼──▶ https://t.me/s/{path}?q
//!                         │   (trace, id,     (fixed headers,        │
//!   relayed response      │    timeout)        30s, 5 redirects)     │
//!   ◀─────────────────────┼── relay headers ◀─ status + body ◀──────┼───
//!                         │                                          │
//!                         │   /health  /test  /  → local JSON        │
//!                         └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use tg_proxy::config::load_config;
use tg_proxy::observability::{logging, metrics};
use tg_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "tg-proxy")]
#[command(about = "Forwards /tg/s/* requests to t.me and relays the response", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port (overrides the config file and PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.port).context("loading configuration")?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address(),
        upstream = %config.upstream.base_url,
        forward_timeout_secs = config.timeouts.forward_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address())
        .await
        .with_context(|| format!("binding {}", config.listener.bind_address()))?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config).context("building upstream client")?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
