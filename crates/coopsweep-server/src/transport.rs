//! Line-delimited JSON over TCP.
//!
//! Each connection gets a writer task draining its `ChannelHub` queue and a
//! reader loop decoding one `ClientEvent` per line. The transport carries no
//! game logic; it only frames lines and reports disconnects.

use std::{net::SocketAddr, time::Duration};

use coopsweep_core::Environment;
use coopsweep_proto::{
    MAX_LINE_BYTES, ProtoError, ServerEvent, SessionId, decode_client_event, encode_server_event,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc,
};

use crate::{
    ServerError,
    channel::{ChannelHub, EventChannel},
    gateway::Connection,
    registry::RoomRegistry,
};

/// TCP listener for line-delimited JSON clients.
#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Bind to `address`.
    pub async fn bind(address: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind { address: address.to_string(), source })?;
        Ok(Self { listener })
    }

    /// Accept the next connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ServerError> {
        Ok(self.listener.accept().await?)
    }

    /// Local address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }
}

/// Serve one client until it disconnects, idles out, or breaks framing.
///
/// Every inbound line, including `ping` and blank lines, resets the idle
/// timer. A client that goes quiet for `idle_timeout` is treated as dead
/// and its room sees a disconnect.
///
/// The first event the client receives is `connected` with its session id.
pub(crate) async fn serve_connection<E>(
    stream: TcpStream,
    session: SessionId,
    hub: ChannelHub,
    registry: RoomRegistry<E, ChannelHub>,
    idle_timeout: Duration,
) -> Result<(), ServerError>
where
    E: Environment,
{
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(%session, "set_nodelay failed: {}", e);
    }
    let (read_half, write_half) = stream.into_split();

    let events = hub.register(session);
    hub.emit_to_one(session, ServerEvent::Connected { session_id: session });
    let writer = tokio::spawn(write_events(write_half, events, session));

    let mut connection = Connection::new(session, registry);
    let result = read_events(read_half, &mut connection, idle_timeout).await;

    connection.disconnect();
    hub.unregister(session);
    writer.abort();

    tracing::debug!(%session, "connection finished");
    result
}

async fn write_events(
    mut writer: OwnedWriteHalf,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    session: SessionId,
) {
    while let Some(event) = events.recv().await {
        let mut line = match encode_server_event(&event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(%session, event = event.name(), "encode failed: {}", e);
                continue;
            },
        };
        line.push('\n');

        if let Err(e) = writer.write_all(line.as_bytes()).await {
            tracing::debug!(%session, "write failed: {}", e);
            break;
        }
    }
}

async fn read_events<E, C>(
    read_half: OwnedReadHalf,
    connection: &mut Connection<E, C>,
    idle_timeout: Duration,
) -> Result<(), ServerError>
where
    E: Environment,
    C: EventChannel,
{
    let session = connection.session();
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        let mut limited = (&mut reader).take(MAX_LINE_BYTES as u64 + 1);
        let read = limited.read_until(b'\n', &mut buf);

        let n = if idle_timeout.is_zero() {
            read.await?
        } else {
            match tokio::time::timeout(idle_timeout, read).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::info!(%session, ?idle_timeout, "idle timeout");
                    return Ok(());
                },
            }
        };

        if n == 0 {
            return Ok(());
        }
        if buf.last() != Some(&b'\n') && buf.len() > MAX_LINE_BYTES {
            tracing::warn!(%session, "line exceeds {} bytes, closing", MAX_LINE_BYTES);
            return Err(ProtoError::TooLarge { size: buf.len(), max: MAX_LINE_BYTES }.into());
        }

        let Ok(line) = std::str::from_utf8(&buf) else {
            tracing::warn!(%session, "non-UTF-8 line skipped");
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }

        match decode_client_event(line) {
            Ok(event) => connection.handle(event).await,
            Err(e) => tracing::warn!(%session, "malformed client event: {}", e),
        }
    }
}
