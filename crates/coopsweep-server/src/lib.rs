//! Coopsweep room server.
//!
//! Hosts cooperative minesweeper rooms: players create or join a room by
//! code, share one authoritative board, and see every reveal, flag and chat
//! message as it happens.
//!
//! ## Architecture
//!
//! ```text
//! coopsweep-server
//!   ├─ SystemEnv       (production Environment impl)
//!   ├─ TcpTransport    (line-delimited JSON over TCP)
//!   ├─ Connection      (per-session routing, lobby validation)
//!   ├─ RoomRegistry    (room codes → room actors)
//!   ├─ room actor      (one task per room, serializes commands)
//!   ├─ Room            (roster, host, BoardEngine; returns actions)
//!   ├─ ActionExecutor  (applies actions to an EventChannel)
//!   └─ ChannelHub      (per-session queues + room topics)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod actor;
mod channel;
mod error;
mod executor;
mod gateway;
mod registry;
mod room;
mod system_env;
mod transport;

use std::{sync::Arc, time::Duration};

pub use actor::{Reply, RoomCommand, RoomHandle};
pub use channel::{ChannelHub, EventChannel};
use coopsweep_core::Environment;
use coopsweep_proto::SessionId;
pub use error::ServerError;
pub use executor::{ActionExecutor, Deferred};
pub use gateway::Connection;
pub use registry::RoomRegistry;
pub use room::{
    DEFAULT_PLAYER_NAME, MAX_CHAT_CHARS, MAX_NAME_CHARS, Room, RoomAction, RoomConfig, RoomError,
    RoomState, sanitize_name,
};
pub use system_env::SystemEnv;
use tokio::sync::Semaphore;
pub use transport::TcpTransport;

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:4000")
    pub bind_address: String,
    /// Maximum concurrent connections
    pub max_connections: usize,
    /// Close connections that send nothing, not even `ping`, for this long.
    /// Zero disables.
    pub idle_timeout: Duration,
    /// Per-room limits
    pub room: RoomConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
            max_connections: 10_000,
            idle_timeout: Duration::from_secs(120),
            room: RoomConfig::default(),
        }
    }
}

/// Production coopsweep server.
///
/// Wraps the room registry with a TCP transport and an environment.
pub struct Server<E: Environment = SystemEnv> {
    transport: TcpTransport,
    registry: RoomRegistry<E, ChannelHub>,
    hub: ChannelHub,
    env: E,
    idle_timeout: Duration,
    connections: Arc<Semaphore>,
}

impl Server<SystemEnv> {
    /// Create and bind a new server with the system environment.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The configuration is invalid
    /// - Binding to the address fails
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        Self::bind_with_env(config, SystemEnv::new()).await
    }
}

impl<E: Environment> Server<E> {
    /// Create and bind a new server with a custom environment.
    pub async fn bind_with_env(config: ServerRuntimeConfig, env: E) -> Result<Self, ServerError> {
        if config.max_connections == 0 {
            return Err(ServerError::Config("max_connections must be at least 1".to_string()));
        }
        if config.room.max_players == 0 {
            return Err(ServerError::Config("rooms need at least one seat".to_string()));
        }

        let transport = TcpTransport::bind(&config.bind_address).await?;
        let hub = ChannelHub::new();
        let registry = RoomRegistry::new(env.clone(), hub.clone(), config.room);

        Ok(Self {
            transport,
            registry,
            hub,
            env,
            idle_timeout: config.idle_timeout,
            connections: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    /// Run the server, accepting connections until the task is cancelled.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server starting on {}", self.transport.local_addr()?);

        loop {
            match self.transport.accept().await {
                Ok((stream, peer)) => {
                    let Ok(permit) = Arc::clone(&self.connections).try_acquire_owned() else {
                        tracing::warn!(%peer, "connection limit reached, rejecting");
                        continue;
                    };

                    let session = SessionId::new(self.env.random_u64());
                    let hub = self.hub.clone();
                    let registry = self.registry.clone();
                    let idle_timeout = self.idle_timeout;

                    tokio::spawn(async move {
                        tracing::debug!(%session, %peer, "connection accepted");
                        let result = transport::serve_connection(
                            stream,
                            session,
                            hub,
                            registry,
                            idle_timeout,
                        )
                        .await;
                        if let Err(e) = result {
                            tracing::debug!(%session, "connection error: {}", e);
                        }
                        drop(permit);
                    });
                },
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                },
            }
        }
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        self.transport.local_addr()
    }

    /// Registry of live rooms.
    pub const fn registry(&self) -> &RoomRegistry<E, ChannelHub> {
        &self.registry
    }
}
