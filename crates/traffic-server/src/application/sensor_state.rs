//! Turns whatever the serial link has pending into a [`TrafficState`].
//!
//! The reader never blocks and never buffers: each call looks at the port
//! once, takes everything that is pending, and forgets it.  A frame that is
//! not fetched by a `/traffic_state` request is overwritten by the next one
//! (or served together with it, if both are still pending).

use tracing::debug;
use traffic_core::{SensorFrame, TrafficState};

/// Byte source behind the state reader.
///
/// Implemented by the device reader, the junction simulator and the null
/// port in [`crate::infrastructure::serial`]; unit tests use the generated
/// `MockSerialPort`.
#[cfg_attr(test, mockall::automock)]
pub trait SerialPort: Send {
    /// Number of bytes that can be read without blocking.
    fn bytes_pending(&mut self) -> usize;

    /// Takes every pending byte.  Returns an empty vector if none are pending.
    fn read_available(&mut self) -> Vec<u8>;
}

/// Polls a [`SerialPort`] once per request.
pub struct SensorStateReader {
    port: Box<dyn SerialPort>,
}

impl SensorStateReader {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Performs one non-blocking check of the port and renders the result.
    pub fn read_state(&mut self) -> TrafficState {
        let pending = self.port.bytes_pending();
        if pending == 0 {
            debug!("serial port has no pending data");
            return TrafficState::no_data();
        }

        let raw = self.port.read_available();
        debug!("read {} bytes from serial port", raw.len());
        TrafficState::from_frame(SensorFrame::decode(&raw))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
