//! Integration tests for the traffic-core public API.
//!
//! These tests feed complete request buffers (as a browser or `curl` would
//! send them) through the tokenizer, the handshake negotiator and the router
//! together, and check the bytes the server would write back.

use traffic_core::{
    derive_accept_key, negotiate, response_head, switching_protocols_response, ContentType,
    HandshakeOutcome, HttpRequest, Route, SensorFrame, TrafficState, WEBSOCKET_GUID,
};

/// A browser's upgrade request, taken from RFC 6455 §1.2.
const BROWSER_UPGRADE: &str = "GET /chat HTTP/1.1\r\n\
Host: server.example.com\r\n\
Upgrade: websocket\r\n\
Connection: Upgrade\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
Origin: http://example.com\r\n\
Sec-WebSocket-Protocol: chat, superchat\r\n\
Sec-WebSocket-Version: 13\r\n\r\n";

const CURL_STATE: &str = "GET /traffic_state HTTP/1.1\r\n\
Host: 192.168.4.1\r\n\
User-Agent: curl/8.5.0\r\n\
Accept: */*\r\n\r\n";

const CURL_ROOT: &str = "GET / HTTP/1.1\r\nHost: 192.168.4.1\r\nAccept: */*\r\n\r\n";

#[test]
fn test_rfc_6455_known_vector() {
    assert_eq!(
        derive_accept_key("dGhlIHNhbXBsZSBub25jZQ==", "258EAFA5-E914-47DA-95CA-C5AB0DC85B11"),
        "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
    );
}

#[test]
fn test_browser_upgrade_request_produces_101_response() {
    // Arrange
    let req = HttpRequest::parse(BROWSER_UPGRADE.as_bytes()).expect("parse");

    // Act
    let outcome = negotiate(&req, WEBSOCKET_GUID);

    // Assert
    let HandshakeOutcome::Upgrade(token) = outcome else {
        panic!("expected upgrade, got {outcome:?}");
    };
    let response = String::from_utf8(switching_protocols_response(&token)).unwrap();
    assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
    assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
    assert!(response.ends_with("\r\n\r\n"));
}

#[test]
fn test_curl_state_request_is_plain_and_routed_to_json() {
    let req = HttpRequest::parse(CURL_STATE.as_bytes()).expect("parse");

    assert_eq!(negotiate(&req, WEBSOCKET_GUID), HandshakeOutcome::PlainHttp);
    assert_eq!(Route::classify(&req.request_line), Route::TrafficState);
}

#[test]
fn test_curl_root_request_is_routed_to_page() {
    let req = HttpRequest::parse(CURL_ROOT.as_bytes()).expect("parse");

    assert_eq!(negotiate(&req, WEBSOCKET_GUID), HandshakeOutcome::PlainHttp);
    assert_eq!(Route::classify(&req.request_line), Route::Page);
}

#[test]
fn test_upgrade_to_state_path_still_upgrades() {
    // The handshake decision is made before routing, so a key on the state
    // path upgrades instead of returning JSON.
    let raw = "GET /traffic_state HTTP/1.1\r\nSec-WebSocket-Key: abc\r\n\r\n";
    let req = HttpRequest::parse(raw.as_bytes()).expect("parse");

    assert!(matches!(
        negotiate(&req, WEBSOCKET_GUID),
        HandshakeOutcome::Upgrade(_)
    ));
}

#[test]
fn test_custom_guid_changes_accept_token() {
    let req = HttpRequest::parse(BROWSER_UPGRADE.as_bytes()).expect("parse");
    let guid = "11111111-2222-3333-4444-555555555555";

    let outcome = negotiate(&req, guid);

    assert_eq!(
        outcome,
        HandshakeOutcome::Upgrade(derive_accept_key("dGhlIHNhbXBsZSBub25jZQ==", guid))
    );
}

#[test]
fn test_full_json_response_bytes_for_red_frame() {
    // Arrange
    let state = TrafficState::from_frame(SensorFrame::decode(b"RED\n"));

    // Act
    let mut response = response_head(ContentType::Json);
    response.extend_from_slice(state.to_json().unwrap().as_bytes());

    // Assert
    assert_eq!(
        String::from_utf8(response).unwrap(),
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n\
         {\"Y_Junction\": \"RED\"}"
    );
}

#[test]
fn test_full_json_response_bytes_without_frame() {
    let mut response = response_head(ContentType::Json);
    response.extend_from_slice(TrafficState::no_data().to_json().unwrap().as_bytes());

    assert!(String::from_utf8(response)
        .unwrap()
        .ends_with("\r\n\r\n{\"error\": \"No data available from UART\"}"));
}

#[test]
fn test_truncated_request_is_still_negotiated() {
    // A 1024-byte read can cut the header block short; whatever arrived is
    // still examined.
    let raw = "GET / HTTP/1.1\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nUser-Ag";
    let req = HttpRequest::parse(raw.as_bytes()).expect("parse");

    assert_eq!(
        negotiate(&req, WEBSOCKET_GUID),
        HandshakeOutcome::Upgrade("s3pPLMBiTxaQ9kYGzzhZRbK+xOo=".to_string())
    );
}
