//! Infrastructure layer for traffic-server.
//!
//! Everything that touches the operating system: sockets, the serial device,
//! background threads and files.
//!
//! # Responsibilities
//!
//! - Binding the listener and running the sequential accept loop
//! - Driving each connection through handshake, response or echo
//! - Feeding serial chunks to the state reader from a background thread
//! - Loading the settings file and the page template
//! - Waiting for network association at startup
//!
//! # What does NOT belong here?
//!
//! - Choosing between the state document and the page (application layer)
//! - Key derivation and request parsing (`traffic-core`)

pub mod connection;
pub mod network;
pub mod serial;
pub mod server;
pub mod storage;

pub use connection::{handle_connection, ConnectionContext, ConnectionOutcome};
pub use network::{associate, HostNetworkLink, LinkError, NetworkLink};
pub use serial::{open_serial, open_serial_or_null, BufferedSerialPort, SerialError, SerialFeed};
pub use server::{bind_listener, run_server, serve, TrafficServer};
pub use storage::{load_page_template, load_settings};
