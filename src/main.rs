//! origin-guard server.
//!
//! Serves an echo WebSocket endpoint at `/ws` behind the origin validator.
//!
//! ```text
//!   Browser / client
//!        │  GET /ws  (Upgrade, Origin: https://app.example.com)
//!        ▼
//!   ┌──────────────────────────────┐
//!   │ TraceLayer                   │
//!   │ OriginValidatorLayer ── 403 ─┼──▶ rejected
//!   │ ws_echo_handler              │
//!   └──────────────────────────────┘
//!        ▲
//!        │ allow-list updates
//!   ConfigWatcher (config file)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use origin_guard::config::{load_config, watcher::ConfigWatcher, GuardConfig};
use origin_guard::http::HttpServer;
use origin_guard::lifecycle::{signals, Shutdown};
use origin_guard::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "origin-guard")]
#[command(about = "WebSocket echo server guarded by Origin validation", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("origin-guard v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mode = ?config.origin.mode,
        debug = config.origin.debug,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    // Keep the watcher alive for the lifetime of the server.
    let (config_updates, _watcher) = match &cli.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (rx, Some(watcher.run()?))
        }
        None => {
            let (_, rx) = mpsc::unbounded_channel();
            (rx, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
