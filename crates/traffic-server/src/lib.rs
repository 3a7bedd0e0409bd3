//! traffic-server library crate.
//!
//! A single-slot HTTP endpoint that reports the state of a Y-junction traffic
//! controller, read from a serial link, and accepts WebSocket upgrades which
//! it answers with a raw byte echo.
//!
//! # Architecture
//!
//! ```text
//! HTTP client / browser
//!         ↕
//! [traffic-server]
//!   ├── domain/           Settings file shape, validated ServerConfig
//!   ├── application/      Sensor polling, cached page, response routing
//!   └── infrastructure/
//!         ├── server/     Sequential accept loop (backlog 1)
//!         ├── connection/ Read → handshake → response or echo
//!         ├── serial/     Device reader, junction simulator
//!         ├── storage/    secrets.json / config.toml, page template
//!         └── network/    Association before bind
//!         ↕
//! PIC18 junction controller (UART)
//! ```
//!
//! # Layer rules
//!
//! - `domain` does no I/O.
//! - `application` depends on `domain` and `traffic-core` only.
//! - `infrastructure` depends on all other layers plus `tokio`.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: what to send back for a plain request.
pub mod application;

/// Infrastructure layer: sockets, serial threads, files.
pub mod infrastructure;
