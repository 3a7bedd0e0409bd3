//! Sensor frames and the traffic-state document served on `/traffic_state`.
//!
//! # Wire format
//!
//! ```json
//! {"Y_Junction": "Y-Junction State: 0x21"}
//! {"error": "No data available from UART"}
//! ```
//!
//! The document uses `": "` between key and value (and `", "` between
//! entries), which is what the dashboard clients were written against.  That
//! is why [`TrafficState::to_json`] goes through [`SpacedFormatter`] instead of
//! `serde_json::to_string`.

use std::borrow::Cow;
use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use tracing::warn;

/// Message reported when the serial source had nothing pending.
pub const NO_DATA_MESSAGE: &str = "No data available from UART";

// ── SensorFrame ───────────────────────────────────────────────────────────────

/// One trimmed, non-empty text reading from the serial source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorFrame(String);

impl SensorFrame {
    /// Decodes a raw chunk read from the serial source.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD and a warning is
    /// logged; the frame is still returned.  Surrounding whitespace
    /// (including the trailing newline the controller sends) is trimmed.
    /// Returns `None` when nothing is left after trimming.
    pub fn decode(raw: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(raw);
        if let Cow::Owned(_) = text {
            warn!(
                "serial chunk of {} bytes was not valid UTF-8; invalid sequences replaced",
                raw.len()
            );
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// ── TrafficState ──────────────────────────────────────────────────────────────

/// The traffic-state document.
///
/// Serde's externally tagged enum representation produces exactly the
/// single-key objects of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficState {
    /// Latest reading for the Y junction.
    #[serde(rename = "Y_Junction")]
    YJunction(String),
    /// No reading was available.
    #[serde(rename = "error")]
    Error(String),
}

impl TrafficState {
    /// The document served when the serial source had nothing pending.
    pub fn no_data() -> Self {
        TrafficState::Error(NO_DATA_MESSAGE.to_string())
    }

    /// Wraps an optional frame.
    pub fn from_frame(frame: Option<SensorFrame>) -> Self {
        match frame {
            Some(frame) => TrafficState::YJunction(frame.into_string()),
            None => Self::no_data(),
        }
    }

    /// Serializes the document in the wire format described at module level.
    ///
    /// # Errors
    ///
    /// Propagates the `serde_json` error; serializing into memory does not
    /// fail in practice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use traffic_core::domain::TrafficState;
    ///
    /// let json = TrafficState::YJunction("RED".into()).to_json().unwrap();
    /// assert_eq!(json, r#"{"Y_Junction": "RED"}"#);
    /// ```
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::with_capacity(64);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        self.serialize(&mut ser)?;
        // serde_json only ever writes valid UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// JSON formatter with `": "` and `", "` separators and no other whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
