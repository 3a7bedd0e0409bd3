//! Serial sources behind [`SerialPort`].
//!
//! A real UART read blocks, while the state reader must never block.  So
//! every producer here runs on its own OS thread and writes raw chunks into a
//! small shared receive buffer.  [`BufferedSerialPort`] takes whatever is in
//! that buffer without waiting whenever the reader asks.
//!
//! ```text
//!  device / simulator thread ──SerialFeed──▶ RxBuffer (≤ 256 B) ◀── BufferedSerialPort
//! ```
//!
//! The buffer behaves like a UART RX FIFO that is only read on demand: once a
//! newer complete frame arrives the older ones are discarded, and it never
//! holds more than [`RX_BUFFER_SIZE`] bytes.  The producer threads stop by
//! themselves once the port is dropped.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use traffic_core::domain::junction::{frame_text, JunctionController, JunctionLights};

use crate::application::SerialPort;
use crate::domain::SerialSelection;

/// Capacity of the receive buffer, in bytes.
pub const RX_BUFFER_SIZE: usize = 256;

/// Frame terminator written by the junction controller.
const FRAME_END: u8 = b'\n';

/// Read buffer of the device thread.
const DEVICE_CHUNK_SIZE: usize = 256;

/// Back-off after end-of-file, e.g. when the writer of a FIFO has gone.
const EOF_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Error type for opening a serial source.
#[derive(Debug, Error)]
pub enum SerialError {
    /// The device node could not be opened.
    #[error("failed to open serial device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The producer thread could not be started.
    #[error("failed to spawn serial thread: {0}")]
    Spawn(#[source] io::Error),
}

// ── Receive buffer ────────────────────────────────────────────────────────────

/// Bytes received since the last read, newest frame only.
#[derive(Debug, Default)]
struct RxBuffer {
    bytes: Vec<u8>,
}

impl RxBuffer {
    /// Appends `chunk`, then drops every complete frame older than the newest
    /// one and trims the front to [`RX_BUFFER_SIZE`].
    fn absorb(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);

        if let Some(last_end) = self.bytes.iter().rposition(|&b| b == FRAME_END) {
            if let Some(stale_end) = self.bytes[..last_end].iter().rposition(|&b| b == FRAME_END) {
                self.bytes.drain(..=stale_end);
            }
        }

        if self.bytes.len() > RX_BUFFER_SIZE {
            let overflow = self.bytes.len() - RX_BUFFER_SIZE;
            debug!("serial receive buffer full, dropping {overflow} oldest bytes");
            self.bytes.drain(..overflow);
        }
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }
}

fn lock(buffer: &Mutex<RxBuffer>) -> MutexGuard<'_, RxBuffer> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Buffered port ─────────────────────────────────────────────────────────────

/// Non-blocking view of a receive buffer filled on another thread.
pub struct BufferedSerialPort {
    rx: Arc<Mutex<RxBuffer>>,
}

/// Producer side of a [`BufferedSerialPort`].
#[derive(Debug, Clone)]
pub struct SerialFeed {
    rx: Weak<Mutex<RxBuffer>>,
}

impl SerialFeed {
    /// Writes `chunk` into the receive buffer.  Returns `false` once the port
    /// has been dropped.
    pub fn push(&self, chunk: impl AsRef<[u8]>) -> bool {
        match self.rx.upgrade() {
            Some(rx) => {
                lock(&rx).absorb(chunk.as_ref());
                true
            }
            None => false,
        }
    }

    /// Whether the port on the other side still exists.
    pub fn is_connected(&self) -> bool {
        self.rx.strong_count() > 0
    }
}

impl BufferedSerialPort {
    /// Creates a connected port/feed pair.
    pub fn pair() -> (Self, SerialFeed) {
        let rx = Arc::new(Mutex::new(RxBuffer::default()));
        let feed = SerialFeed {
            rx: Arc::downgrade(&rx),
        };
        (Self { rx }, feed)
    }
}

impl SerialPort for BufferedSerialPort {
    fn bytes_pending(&mut self) -> usize {
        lock(&self.rx).len()
    }

    fn read_available(&mut self) -> Vec<u8> {
        lock(&self.rx).take()
    }
}

// ── Null port ─────────────────────────────────────────────────────────────────

/// Port used when no serial source is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSerialPort;

impl SerialPort for NullSerialPort {
    fn bytes_pending(&mut self) -> usize {
        0
    }

    fn read_available(&mut self) -> Vec<u8> {
        Vec::new()
    }
}

// ── Producers ─────────────────────────────────────────────────────────────────

/// Opens the source named by `selection`.
///
/// # Errors
///
/// Returns [`SerialError`] if a device cannot be opened or a thread cannot be
/// spawned.
pub fn open_serial(selection: &SerialSelection) -> Result<Box<dyn SerialPort>, SerialError> {
    match selection {
        SerialSelection::Device(path) => Ok(Box::new(spawn_device_reader(path)?)),
        SerialSelection::Simulated => Ok(Box::new(spawn_simulator()?)),
        SerialSelection::Disabled => {
            info!("no serial source configured; state requests will report no data");
            Ok(Box::new(NullSerialPort))
        }
    }
}

/// Logs and replaces a failed source with [`NullSerialPort`].
pub fn open_serial_or_null(selection: &SerialSelection) -> Box<dyn SerialPort> {
    open_serial(selection).unwrap_or_else(|e| {
        warn!("{e}; continuing without a serial source");
        Box::new(NullSerialPort)
    })
}

/// Reads chunks from a device node (or FIFO / regular file) on a background
/// thread.
pub fn spawn_device_reader(path: &Path) -> Result<BufferedSerialPort, SerialError> {
    let file = File::open(path).map_err(|source| SerialError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let (port, feed) = BufferedSerialPort::pair();
    let display = path.display().to_string();

    thread::Builder::new()
        .name("serial-device".to_string())
        .spawn(move || device_loop(file, feed, &display))
        .map_err(SerialError::Spawn)?;

    info!("reading serial frames from {}", path.display());
    Ok(port)
}

fn device_loop(mut file: File, feed: SerialFeed, path: &str) {
    let mut buf = [0u8; DEVICE_CHUNK_SIZE];
    loop {
        match file.read(&mut buf) {
            Ok(0) => {
                if !feed.is_connected() {
                    debug!("serial {path}: port dropped, stopping reader");
                    return;
                }
                thread::sleep(EOF_RETRY_DELAY);
            }
            Ok(n) => {
                debug!("serial {path}: {n} bytes");
                if !feed.push(&buf[..n]) {
                    debug!("serial {path}: port dropped, stopping reader");
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => {
                error!("serial {path}: read failed, stopping reader: {e}");
                return;
            }
        }
    }
}

/// Runs the Y-junction controller on a background thread and emits one
/// status frame per state, like the junction firmware does.
pub fn spawn_simulator() -> Result<BufferedSerialPort, SerialError> {
    spawn_simulator_with_speedup(1)
}

/// Same as [`spawn_simulator`], with every dwell time divided by `speedup`.
fn spawn_simulator_with_speedup(speedup: u32) -> Result<BufferedSerialPort, SerialError> {
    let (port, feed) = BufferedSerialPort::pair();
    let speedup = speedup.max(1);

    thread::Builder::new()
        .name("junction-sim".to_string())
        .spawn(move || simulator_loop(JunctionController::new(), feed, speedup))
        .map_err(SerialError::Spawn)?;

    info!("serial source: simulated Y-junction");
    Ok(port)
}

/// The firmware moves to the next state before reporting, so the first frame
/// after power-up is `waitN`, not `goN`.
fn simulator_loop(mut controller: JunctionController, feed: SerialFeed, speedup: u32) {
    loop {
        let state = *controller.advance();
        debug!(
            "junction {}: {}",
            state.name,
            JunctionLights::decode(state.output)
        );
        if !feed.push(frame_text(state.output)) {
            debug!("simulator port dropped, stopping");
            return;
        }
        thread::sleep(state.dwell() / speedup);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
