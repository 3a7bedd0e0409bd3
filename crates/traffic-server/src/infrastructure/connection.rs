//! Per-connection state machine.
//!
//! ```text
//!  read ≤1024 ─▶ parse ─▶ negotiate ─┬─ Upgrade ──▶ 101 ─▶ echo loop ─▶ close
//!                                    └─ PlainHttp ─▶ 200 + body ─────▶ close
//! ```
//!
//! Generic over the stream type so that the same code runs against a real
//! `TcpStream` and against `tokio_test::io::Mock` in the tests below.
//!
//! After the upgrade the connection is a raw byte echo: whatever arrives in
//! one read is written back unchanged.  No WebSocket frames are decoded.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use traffic_core::{
    negotiate, switching_protocols_response, HandshakeOutcome, HttpRequest, Route,
    MAX_REQUEST_SIZE,
};

use crate::application::{RequestRouter, SensorStateReader};

/// Read size in the echo loop.
pub const ECHO_CHUNK_SIZE: usize = 1024;

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// The peer closed (or sent nothing) before a request arrived.
    Empty,
    /// A plain-HTTP response was sent.
    Served(Route),
    /// The connection was upgraded and echoed `bytes` bytes before closing.
    Echoed { bytes: u64 },
}

/// Everything a connection needs besides the stream.
pub struct ConnectionContext<'a> {
    pub guid: &'a str,
    pub router: &'a RequestRouter,
    pub sensor: &'a mut SensorStateReader,
}

/// Serves one connection to completion.
///
/// The caller closes the stream by dropping it afterwards.
///
/// # Errors
///
/// Returns an error if the initial read or the response write fails.  Errors
/// inside the echo loop end the session and are only logged.
pub async fn handle_connection<S>(
    stream: &mut S,
    peer: &str,
    ctx: ConnectionContext<'_>,
) -> io::Result<ConnectionOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; MAX_REQUEST_SIZE];
    let n = stream.read(&mut buf).await?;

    let request = match HttpRequest::parse(&buf[..n]) {
        Ok(request) => request,
        Err(e) => {
            debug!("{peer}: {e}; closing without response");
            return Ok(ConnectionOutcome::Empty);
        }
    };
    debug!("{peer}: {}", request.request_line);

    match negotiate(&request, ctx.guid) {
        HandshakeOutcome::Upgrade(token) => {
            stream.write_all(&switching_protocols_response(&token)).await?;
            info!("{peer}: switched to WebSocket echo");
            let bytes = echo_loop(stream, peer).await;
            Ok(ConnectionOutcome::Echoed { bytes })
        }
        HandshakeOutcome::PlainHttp => {
            let response = ctx.router.respond(&request, ctx.sensor)?;
            stream.write_all(&response.bytes).await?;
            stream.flush().await?;
            debug!("{peer}: served {:?}, {} bytes", response.route, response.bytes.len());
            Ok(ConnectionOutcome::Served(response.route))
        }
    }
}

/// Echoes every chunk back until the peer closes or an I/O error occurs.
/// Returns the number of bytes echoed.
async fn echo_loop<S>(stream: &mut S, peer: &str) -> u64
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; ECHO_CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => {
                debug!("{peer}: peer closed echo session");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                warn!("{peer}: echo read failed: {e}");
                break;
            }
        };

        if let Err(e) = stream.write_all(&buf[..n]).await {
            warn!("{peer}: echo write failed: {e}");
            break;
        }
        debug!("{peer}: echoed {n} bytes");
        total += n as u64;
    }

    total
}

// ── Tests ─────────────────────────────────────────────────────────────────────
