//! End-to-end tests over real TCP sockets.

use std::{net::SocketAddr, time::Duration};

use coopsweep_proto::{
    ClientEvent, RoomErrorKind, ServerEvent, decode_server_event, encode_client_event,
};
use coopsweep_server::{RoomConfig, Server, ServerRuntimeConfig};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

async fn start(max_connections: usize) -> SocketAddr {
    start_with(ServerRuntimeConfig { max_connections, ..local_config() }).await
}

fn local_config() -> ServerRuntimeConfig {
    ServerRuntimeConfig { bind_address: "127.0.0.1:0".to_string(), ..Default::default() }
}

async fn start_with(config: ServerRuntimeConfig) -> SocketAddr {
    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, writer) = stream.into_split();
        Self { reader: BufReader::new(read), writer }
    }

    async fn send(&mut self, event: &ClientEvent) {
        let mut line = encode_client_event(event).unwrap();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    /// Next line, or `None` once the server closed the connection.
    async fn next_line(&mut self) -> Option<String> {
        let mut line = String::new();
        let read = tokio::time::timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for server");
        match read {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }

    async fn next(&mut self) -> ServerEvent {
        let line = self.next_line().await.expect("connection closed");
        decode_server_event(&line).unwrap()
    }
}

#[tokio::test]
async fn connection_greets_with_session_id() {
    let addr = start(16).await;
    let mut client = TestClient::connect(addr).await;

    match client.next().await {
        ServerEvent::Connected { session_id } => assert_eq!(session_id.to_string().len(), 16),
        other => panic!("expected connected, got {other:?}"),
    }
}

#[tokio::test]
async fn two_clients_share_a_room() {
    let addr = start(16).await;
    let mut alice = TestClient::connect(addr).await;
    let mut bob = TestClient::connect(addr).await;
    alice.next().await;
    bob.next().await;

    alice.send(&ClientEvent::CreateRoom { name: "alice".into() }).await;
    let code = match alice.next().await {
        ServerEvent::RoomCreated { room_code } => room_code,
        other => panic!("expected roomCreated, got {other:?}"),
    };
    assert!(matches!(alice.next().await, ServerEvent::GameState(_)));

    bob.send(&ClientEvent::JoinRoom { name: "bob".into(), room_code: code.to_string() }).await;
    assert_eq!(bob.next().await, ServerEvent::RoomJoined { room_code: code });
    match bob.next().await {
        ServerEvent::GameState(state) => assert_eq!(state.players.len(), 2),
        other => panic!("expected gameState, got {other:?}"),
    }

    alice.send(&ClientEvent::ChatMessage { text: "hello".into() }).await;
    // Alice's own queue: roster update, playerJoined, then her chat.
    assert!(matches!(alice.next().await, ServerEvent::GameState(_)));
    assert!(matches!(alice.next().await, ServerEvent::PlayerJoined(_)));
    match bob.next().await {
        ServerEvent::ChatMessage { message, .. } => assert_eq!(message, "hello"),
        other => panic!("expected chatMessage, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_lines_are_skipped() {
    let addr = start(16).await;
    let mut client = TestClient::connect(addr).await;
    client.next().await;

    client.send_raw(b"not json\n").await;
    client.send_raw(b"{\"event\":\"noSuchEvent\"}\n").await;
    client.send_raw(b"\n").await;
    client
        .send(&ClientEvent::JoinRoom { name: "x".into(), room_code: "ZZZZZZ".into() })
        .await;

    match client.next().await {
        ServerEvent::RoomError { kind, .. } => assert_eq!(kind, RoomErrorKind::RoomNotFound),
        other => panic!("expected roomError, got {other:?}"),
    }
}

#[tokio::test]
async fn oversize_line_closes_connection() {
    let addr = start(16).await;
    let mut client = TestClient::connect(addr).await;
    client.next().await;

    let blob = vec![b'a'; coopsweep_proto::MAX_LINE_BYTES + 64];
    // The server may reset before the whole blob is written.
    let _ = client.writer.write_all(&blob).await;

    assert_eq!(client.next_line().await, None);
}

#[tokio::test]
async fn connections_over_limit_are_dropped() {
    let addr = start(1).await;
    let mut first = TestClient::connect(addr).await;
    first.next().await;

    let mut second = TestClient::connect(addr).await;
    assert_eq!(second.next_line().await, None);

    // The first connection is unaffected.
    first
        .send(&ClientEvent::JoinRoom { name: "x".into(), room_code: "ZZZZZZ".into() })
        .await;
    assert!(matches!(first.next().await, ServerEvent::RoomError { .. }));
}

/// Short idle timeout and grace window so eviction would show within a
/// second.
fn impatient_config() -> ServerRuntimeConfig {
    ServerRuntimeConfig {
        idle_timeout: Duration::from_millis(300),
        room: RoomConfig { reconnect_grace: Duration::from_millis(100), ..RoomConfig::default() },
        ..local_config()
    }
}

#[tokio::test]
async fn silent_connection_is_closed_after_idle_timeout() {
    let addr = start_with(impatient_config()).await;
    let mut client = TestClient::connect(addr).await;
    client.next().await;

    assert_eq!(client.next_line().await, None);
}

#[tokio::test]
async fn pinging_watcher_keeps_its_seat() {
    let addr = start_with(impatient_config()).await;
    let mut host = TestClient::connect(addr).await;
    let mut watcher = TestClient::connect(addr).await;
    host.next().await;
    watcher.next().await;

    host.send(&ClientEvent::CreateRoom { name: "host".into() }).await;
    let code = match host.next().await {
        ServerEvent::RoomCreated { room_code } => room_code,
        other => panic!("expected roomCreated, got {other:?}"),
    };
    watcher.send(&ClientEvent::JoinRoom { name: "watcher".into(), room_code: code.to_string() }).await;
    assert!(matches!(watcher.next().await, ServerEvent::RoomJoined { .. }));
    assert!(matches!(watcher.next().await, ServerEvent::GameState(_)));

    // Well past idle timeout plus grace, with the watcher only pinging.
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        watcher.send(&ClientEvent::Ping).await;
        assert_eq!(watcher.next().await, ServerEvent::Pong);
        host.send(&ClientEvent::Ping).await;
    }

    host.send(&ClientEvent::ChatMessage { text: "still there?".into() }).await;
    loop {
        match host.next().await {
            ServerEvent::ChatMessage { .. } => break,
            ServerEvent::PlayerLeft { .. } => panic!("watcher was evicted while pinging"),
            _ => {},
        }
    }
    match watcher.next().await {
        ServerEvent::ChatMessage { message, .. } => assert_eq!(message, "still there?"),
        other => panic!("expected chatMessage, got {other:?}"),
    }
}
