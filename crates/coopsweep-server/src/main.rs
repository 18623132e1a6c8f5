//! Coopsweep server binary.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default port
//! coopsweep-server --bind 0.0.0.0:4000
//!
//! # Drop disconnected players immediately and keep idle clients for 5 min
//! coopsweep-server --reconnect-grace-secs 0 --idle-timeout-secs 300
//! ```

use std::time::Duration;

use clap::Parser;
use coopsweep_server::{RoomConfig, Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Cooperative minesweeper room server
#[derive(Parser, Debug)]
#[command(name = "coopsweep-server")]
#[command(about = "Cooperative minesweeper room server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:4000")]
    bind: String,

    /// Maximum concurrent connections
    #[arg(long, default_value = "10000")]
    max_connections: usize,

    /// Seconds a disconnected player keeps their seat (0 = leave at once)
    #[arg(long, default_value = "10")]
    reconnect_grace_secs: u64,

    /// Seconds without input before a connection is closed (0 = never)
    #[arg(long, default_value = "120")]
    idle_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn runtime_config(&self) -> ServerRuntimeConfig {
        ServerRuntimeConfig {
            bind_address: self.bind.clone(),
            max_connections: self.max_connections,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            room: RoomConfig {
                reconnect_grace: Duration::from_secs(self.reconnect_grace_secs),
                ..RoomConfig::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = args.runtime_config();
    tracing::info!(
        bind = %config.bind_address,
        max_connections = config.max_connections,
        grace = ?config.room.reconnect_grace,
        idle = ?config.idle_timeout,
        "coopsweep server starting"
    );
    if config.room.reconnect_grace.is_zero() {
        tracing::warn!("reconnect grace disabled, a dropped connection leaves its room at once");
    }

    let server = Server::bind(config).await?;
    tracing::info!("listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
