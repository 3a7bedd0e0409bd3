//! Protocol module: request tokenizing, WebSocket handshake and routing.

pub mod handshake;
pub mod request;
pub mod routing;

pub use handshake::{derive_accept_key, negotiate, HandshakeOutcome, WEBSOCKET_GUID};
pub use request::{HeaderField, HttpRequest, RequestError, MAX_REQUEST_SIZE};
pub use routing::{response_head, ContentType, Route};
