//! # traffic-core
//!
//! Protocol and domain logic for the traffic-state endpoint: a tiny server
//! that exposes the state of a traffic-light controller (received over a
//! serial link) to HTTP and WebSocket clients.
//!
//! This crate has no sockets, threads or files.  It turns the bytes of an
//! initial request into a decision, and a sensor reading into a document:
//!
//! - **`protocol`** – the CRLF line tokenizer ([`HttpRequest`]), the RFC 6455
//!   handshake ([`derive_accept_key`], [`negotiate`]) and plain-request
//!   routing ([`Route`]).
//!
//! - **`domain`** – [`SensorFrame`] and [`TrafficState`], plus the state table
//!   of the Y-junction controller that produces the frames.
//!
//! The `traffic-server` crate owns the listener, the serial port and the
//! connection state machine, and calls into this crate for every decision.

pub mod domain;
pub mod protocol;

pub use domain::{SensorFrame, TrafficState, NO_DATA_MESSAGE};
pub use protocol::handshake::{
    derive_accept_key, negotiate, switching_protocols_response, HandshakeOutcome, WEBSOCKET_GUID,
};
pub use protocol::request::{HttpRequest, RequestError, MAX_REQUEST_SIZE};
pub use protocol::routing::{response_head, ContentType, Route};
