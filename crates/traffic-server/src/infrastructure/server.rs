//! Accept loop.
//!
//! The server serves exactly one connection at a time.  An accepted socket is
//! handled inline, to completion, before `accept` is called again; a client
//! holding an echo session open therefore delays everyone else.  Further
//! clients wait in the kernel's listen queue, whose backlog is 1.
//!
//! Shutdown is triggered by clearing the shared `running` flag (see
//! `main.rs`).  The flag is checked between connections, so an open echo
//! session is allowed to finish first.

use std::io;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::application::{RequestRouter, SensorStateReader};
use crate::domain::ListenConfig;
use crate::infrastructure::connection::{handle_connection, ConnectionContext, ConnectionOutcome};

/// Length of the kernel's pending-connection queue.
pub const LISTEN_BACKLOG: u32 = 1;

/// How often the accept loop wakes up to look at the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// The state shared by all connections: handshake GUID, router with the
/// cached page, and the serial reader.
pub struct TrafficServer {
    guid: String,
    router: RequestRouter,
    sensor: SensorStateReader,
}

impl TrafficServer {
    pub fn new(guid: impl Into<String>, router: RequestRouter, sensor: SensorStateReader) -> Self {
        Self {
            guid: guid.into(),
            router,
            sensor,
        }
    }

    /// Serves one connection; see [`handle_connection`].
    pub async fn serve_connection<S>(
        &mut self,
        stream: &mut S,
        peer: &str,
    ) -> io::Result<ConnectionOutcome>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let ctx = ConnectionContext {
            guid: &self.guid,
            router: &self.router,
            sensor: &mut self.sensor,
        };
        handle_connection(stream, peer, ctx).await
    }
}

/// Binds a listener on `addr` with a backlog of [`LISTEN_BACKLOG`].
///
/// Must be called from inside a Tokio runtime.
pub fn bind_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

/// Binds `listen` and serves connections until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, missing
/// permission for ports below 1024, address not local).
pub async fn run_server(
    listen: ListenConfig,
    server: TrafficServer,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let addr = listen.socket_addr();
    let listener =
        bind_listener(addr).with_context(|| format!("failed to bind listener on {addr}"))?;
    info!("listening on {addr}");
    serve(listener, server, running).await
}

/// Runs the accept loop on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    mut server: TrafficServer,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((mut stream, peer_addr))) => {
                let peer = peer_addr.to_string();
                info!("connection from {peer}");

                match server.serve_connection(&mut stream, &peer).await {
                    Ok(outcome) => info!("{peer}: closed ({outcome:?})"),
                    Err(e) => warn!("{peer}: closed with error: {e}"),
                }
                if let Err(e) = stream.shutdown().await {
                    debug!("{peer}: shutdown: {e}");
                }
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
