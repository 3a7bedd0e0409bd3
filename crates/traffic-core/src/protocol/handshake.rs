//! WebSocket opening handshake (RFC 6455 §4.2.2, server side).
//!
//! Only the part of the handshake the endpoint needs is implemented: find the
//! client's `Sec-WebSocket-Key`, derive the accept token, and build the fixed
//! `101 Switching Protocols` response.  Requests without a usable key fall
//! back to plain HTTP; the negotiator never fails.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};
use tracing::{debug, warn};

use crate::protocol::request::HttpRequest;

/// The GUID every RFC 6455 server appends to the client key.
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Header carrying the client's handshake nonce.
pub const WEBSOCKET_KEY_HEADER: &str = "Sec-WebSocket-Key";

/// Length of a Base64-encoded SHA-1 digest (20 bytes → 28 characters).
pub const ACCEPT_TOKEN_LEN: usize = 28;

/// Result of inspecting the initial request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// The client asked for a WebSocket upgrade; carries the accept token.
    Upgrade(String),
    /// No usable upgrade key; serve the request as plain HTTP.
    PlainHttp,
}

/// Computes `Base64(SHA1(key ++ guid))`.
///
/// The key is treated as opaque bytes.  Checking that it is itself a 16-byte
/// Base64 nonce is the client's obligation.
///
/// # Examples
///
/// ```rust
/// use traffic_core::protocol::handshake::{derive_accept_key, WEBSOCKET_GUID};
///
/// let token = derive_accept_key("dGhlIHNhbXBsZSBub25jZQ==", WEBSOCKET_GUID);
/// assert_eq!(token, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn derive_accept_key(key: &str, guid: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(guid.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Decides between upgrade and plain HTTP for a tokenized request.
///
/// The first header named exactly `Sec-WebSocket-Key` wins.  If that header
/// has no `": "` separator, or its value is empty, the request is served as
/// plain HTTP and a warning is logged.
pub fn negotiate(request: &HttpRequest, guid: &str) -> HandshakeOutcome {
    let Some(field) = request.header(WEBSOCKET_KEY_HEADER) else {
        debug!("no {WEBSOCKET_KEY_HEADER} header; treating as plain HTTP");
        return HandshakeOutcome::PlainHttp;
    };

    match field.value.as_deref() {
        Some(key) if !key.is_empty() => HandshakeOutcome::Upgrade(derive_accept_key(key, guid)),
        Some(_) => {
            warn!("empty {WEBSOCKET_KEY_HEADER} header; falling back to plain HTTP");
            HandshakeOutcome::PlainHttp
        }
        None => {
            warn!("malformed {WEBSOCKET_KEY_HEADER} header line; falling back to plain HTTP");
            HandshakeOutcome::PlainHttp
        }
    }
}

/// Builds the `101 Switching Protocols` response for `accept_token`.
pub fn switching_protocols_response(accept_token: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept_token}\r\n\r\n"
    )
    .into_bytes()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
