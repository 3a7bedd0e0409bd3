//! End-to-end tests over real loopback sockets.
//!
//! Each test binds an ephemeral port, runs the accept loop in a background
//! task and talks to it with plain `TcpStream`s or a `tokio-tungstenite`
//! client.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use traffic_core::WEBSOCKET_GUID;
use traffic_server::application::{CachedPage, RequestRouter, SensorStateReader};
use traffic_server::infrastructure::{
    bind_listener, serve, BufferedSerialPort, SerialFeed, TrafficServer,
};

const PAGE: &str = "<h1>Hello from ESP32</h1>";

struct Running {
    addr: SocketAddr,
    flag: Arc<AtomicBool>,
    handle: JoinHandle<anyhow::Result<()>>,
    feed: SerialFeed,
}

impl Running {
    async fn stop(self) {
        self.flag.store(false, Ordering::Relaxed);
        self.handle.await.unwrap().unwrap();
    }
}

fn start() -> Running {
    let listener = bind_listener(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).unwrap();
    let addr = listener.local_addr().unwrap();
    let (port, feed) = BufferedSerialPort::pair();
    let server = TrafficServer::new(
        WEBSOCKET_GUID,
        RequestRouter::new(CachedPage::render(PAGE, &BTreeMap::new())),
        SensorStateReader::new(Box::new(port)),
    );
    let flag = Arc::new(AtomicBool::new(true));
    let handle = tokio::spawn(serve(listener, server, Arc::clone(&flag)));
    Running {
        addr,
        flag,
        handle,
        feed,
    }
}

/// Sends `request` and reads until the server closes.
async fn fetch(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("server did not close the connection")
        .unwrap();
    String::from_utf8(response).unwrap()
}

/// Opens a connection and completes the handshake by hand.
async fn upgrade(addr: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET /ws HTTP/1.1\r\nHost: esp32\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n\r\n",
        )
        .await
        .unwrap();

    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).await.unwrap();
        head.push(byte[0]);
    }
    let head = String::from_utf8(head).unwrap();
    assert!(head.starts_with("HTTP/1.1 101 Switching Protocols\r\n"), "{head}");
    assert!(head.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"), "{head}");
    stream
}

#[tokio::test]
async fn test_traffic_state_reports_serial_frame() {
    // Arrange
    let server = start();
    assert!(server.feed.push("RED\n"));

    // Act
    let response = fetch(server.addr, "GET /traffic_state HTTP/1.1\r\nHost: esp32\r\n\r\n").await;

    // Assert
    assert_eq!(
        response,
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n\
         {\"Y_Junction\": \"RED\"}"
    );
    server.stop().await;
}

#[tokio::test]
async fn test_traffic_state_without_data_reports_error() {
    let server = start();

    let response = fetch(server.addr, "GET /traffic_state HTTP/1.1\r\n\r\n").await;

    assert!(
        response.ends_with("\r\n\r\n{\"error\": \"No data available from UART\"}"),
        "{response}"
    );
    server.stop().await;
}

#[tokio::test]
async fn test_frame_is_consumed_by_first_state_request() {
    // Arrange
    let server = start();
    assert!(server.feed.push("GREEN\n"));

    // Act
    let first = fetch(server.addr, "GET /traffic_state HTTP/1.1\r\n\r\n").await;
    let second = fetch(server.addr, "GET /traffic_state HTTP/1.1\r\n\r\n").await;

    // Assert
    assert!(first.ends_with(r#"{"Y_Junction": "GREEN"}"#), "{first}");
    assert!(second.ends_with(r#"{"error": "No data available from UART"}"#), "{second}");
    server.stop().await;
}

#[tokio::test]
async fn test_state_request_sees_only_newest_unread_frame() {
    // Arrange: two frames arrive between polls.
    let server = start();
    assert!(server.feed.push("RED\n"));
    assert!(server.feed.push("GREEN\n"));

    // Act
    let first = fetch(server.addr, "GET /traffic_state HTTP/1.1\r\n\r\n").await;
    let second = fetch(server.addr, "GET /traffic_state HTTP/1.1\r\n\r\n").await;

    // Assert: the older frame is gone, not served on the next request.
    assert!(first.ends_with(r#"{"Y_Junction": "GREEN"}"#), "{first}");
    assert!(second.ends_with(r#"{"error": "No data available from UART"}"#), "{second}");
    server.stop().await;
}

#[tokio::test]
async fn test_state_after_frame_burst_stays_one_frame() {
    // Arrange
    let server = start();
    for i in 0..10_000u32 {
        assert!(server.feed.push(format!("Y-Junction State: 0x{:X}\n", i % 8)));
    }

    // Act
    let response = fetch(server.addr, "GET /traffic_state HTTP/1.1\r\n\r\n").await;

    // Assert
    assert!(
        response.ends_with(r#"{"Y_Junction": "Y-Junction State: 0x7"}"#),
        "{response}"
    );
    server.stop().await;
}

#[tokio::test]
async fn test_other_paths_get_cached_page() {
    let server = start();

    for path in ["/", "/index.html", "/traffic"] {
        let response = fetch(server.addr, &format!("GET {path} HTTP/1.1\r\n\r\n")).await;
        assert_eq!(
            response,
            format!("HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n{PAGE}")
        );
    }
    server.stop().await;
}

#[tokio::test]
async fn test_page_request_leaves_serial_data_pending() {
    // Arrange
    let server = start();
    assert!(server.feed.push("YELLOW\n"));

    // Act
    fetch(server.addr, "GET / HTTP/1.1\r\n\r\n").await;
    let state = fetch(server.addr, "GET /traffic_state HTTP/1.1\r\n\r\n").await;

    // Assert
    assert!(state.ends_with(r#"{"Y_Junction": "YELLOW"}"#), "{state}");
    server.stop().await;
}

#[tokio::test]
async fn test_websocket_client_accepts_handshake() {
    // Arrange
    let server = start();
    let stream = TcpStream::connect(server.addr).await.unwrap();
    let url = format!("ws://{}/ws", server.addr);

    // Act
    let (ws, response) = tokio_tungstenite::client_async(url, stream)
        .await
        .expect("handshake rejected by client");

    // Assert
    assert_eq!(response.status().as_u16(), 101);
    drop(ws);
    server.stop().await;
}

#[tokio::test]
async fn test_upgraded_connection_echoes_raw_bytes() {
    // Arrange
    let server = start();
    let mut stream = upgrade(server.addr).await;

    // Act
    stream.write_all(b"ping").await.unwrap();
    let mut echoed = [0u8; 4];
    timeout(Duration::from_secs(5), stream.read_exact(&mut echoed))
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert_eq!(&echoed, b"ping");
    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn test_second_client_waits_for_echo_session_to_end() {
    // Arrange: first client holds an echo session open.
    let server = start();
    let mut first = upgrade(server.addr).await;

    let mut second = TcpStream::connect(server.addr).await.unwrap();
    second
        .write_all(b"GET /traffic_state HTTP/1.1\r\n\r\n")
        .await
        .unwrap();

    // Act / Assert: nothing comes back while the first session is open.
    let mut buf = [0u8; 64];
    let early = timeout(Duration::from_millis(300), second.read(&mut buf)).await;
    assert!(early.is_err(), "second client was served concurrently");

    first.write_all(b"still here").await.unwrap();
    let mut echoed = [0u8; 10];
    first.read_exact(&mut echoed).await.unwrap();
    drop(first);

    // Once the first peer closes, the queued client is served.
    let mut response = Vec::new();
    timeout(Duration::from_secs(5), second.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    let response = String::from_utf8(response).unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    server.stop().await;
}

#[tokio::test]
async fn test_connection_closed_without_request_is_skipped() {
    // Arrange
    let server = start();

    // Act: connect and close immediately, then make a real request.
    drop(TcpStream::connect(server.addr).await.unwrap());
    let response = fetch(server.addr, "GET / HTTP/1.1\r\n\r\n").await;

    // Assert
    assert!(response.ends_with(PAGE), "{response}");
    server.stop().await;
}
