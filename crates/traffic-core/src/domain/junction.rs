//! The Y-junction traffic-light controller that feeds the serial link.
//!
//! The controller is a Moore machine: each state drives one light pattern for
//! a fixed dwell time, then moves to its successor.  After every transition it
//! writes one line to its UART:
//!
//! ```text
//! Y-Junction State: 0x21\n
//! ```
//!
//! The endpoint never interprets that text (it is forwarded verbatim), but
//! the table is used by the simulated serial source and the decoder below is
//! used to log what a frame means.

use std::fmt;
use std::time::Duration;

/// Index of a state in [`Y_JUNCTION`].
pub type StateIndex = usize;

/// One row of the controller's state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JunctionState {
    /// Short mnemonic (`goN`, `waitN`, ...).
    pub name: &'static str,
    /// Light pattern written to the lamp driver.
    pub output: u8,
    /// How long the pattern is held, in milliseconds.
    pub dwell_ms: u64,
    /// Successor state.  The controller's sensor inputs never change the
    /// successor, so a single index is enough.
    pub next: StateIndex,
}

impl JunctionState {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }
}

pub const GO_N: StateIndex = 0;
pub const WAIT_N: StateIndex = 1;
pub const GO_E: StateIndex = 2;
pub const WAIT_E: StateIndex = 3;
pub const GO_S: StateIndex = 4;
pub const WAIT_S: StateIndex = 5;
pub const GO_W: StateIndex = 6;
pub const WAIT_W: StateIndex = 7;

/// State table of the Y-junction controller.
pub const Y_JUNCTION: [JunctionState; 8] = [
    JunctionState { name: "goN", output: 0x21, dwell_ms: 3000, next: WAIT_N },
    JunctionState { name: "waitN", output: 0x22, dwell_ms: 500, next: GO_E },
    JunctionState { name: "goE", output: 0x0C, dwell_ms: 3000, next: WAIT_E },
    JunctionState { name: "waitE", output: 0x14, dwell_ms: 500, next: GO_N },
    JunctionState { name: "goS", output: 0x28, dwell_ms: 3000, next: WAIT_N },
    JunctionState { name: "waitS", output: 0x18, dwell_ms: 500, next: GO_S },
    JunctionState { name: "goW", output: 0x03, dwell_ms: 3000, next: WAIT_S },
    JunctionState { name: "waitW", output: 0x04, dwell_ms: 500, next: GO_N },
];

/// Formats the UART line the controller emits for `output`.
///
/// The controller prints the pattern with `%lX`, i.e. upper-case hex without
/// zero padding (`0xC`, not `0x0C`).
pub fn frame_text(output: u8) -> String {
    format!("Y-Junction State: 0x{output:X}\n")
}

/// Walks [`Y_JUNCTION`] from a starting state.
#[derive(Debug, Clone)]
pub struct JunctionController {
    current: StateIndex,
}

impl JunctionController {
    /// Starts at `goN`, as the controller does on power-up.
    pub fn new() -> Self {
        Self { current: GO_N }
    }

    pub fn state(&self) -> &JunctionState {
        &Y_JUNCTION[self.current]
    }

    /// Moves to the successor state and returns it.
    pub fn advance(&mut self) -> &JunctionState {
        self.current = Y_JUNCTION[self.current].next;
        self.state()
    }
}

impl Default for JunctionController {
    fn default() -> Self {
        Self::new()
    }
}

// ── Lamp decoding ─────────────────────────────────────────────────────────────

/// Lamp states of the Y junction decoded from an output pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JunctionLights {
    pub north_green: bool,
    pub north_yellow: bool,
    pub north_red: bool,
    pub south_east_green: bool,
    pub south_east_yellow: bool,
    pub south_east_red: bool,
}

impl JunctionLights {
    /// Decodes a pattern using the Y-junction bit assignment.
    ///
    /// South-east green is wired to two bits (`0x03`) and lights if either is
    /// set.
    pub fn decode(output: u8) -> Self {
        Self {
            north_green: output & 0x08 != 0,
            north_yellow: output & 0x10 != 0,
            north_red: output & 0x20 != 0,
            south_east_green: output & 0x03 != 0,
            south_east_yellow: output & 0x04 != 0,
            south_east_red: output & 0x01 != 0,
        }
    }

    /// Parses a `Y-Junction State: 0x..` line and decodes its pattern.
    pub fn from_frame_text(text: &str) -> Option<Self> {
        let hex = text.trim().strip_prefix("Y-Junction State: 0x")?;
        u8::from_str_radix(hex, 16).ok().map(Self::decode)
    }
}

impl fmt::Display for JunctionLights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on = |lit: bool| if lit { "On" } else { "Off" };
        write!(
            f,
            "N green={} yellow={} red={}; SE green={} yellow={} red={}",
            on(self.north_green),
            on(self.north_yellow),
            on(self.north_red),
            on(self.south_east_green),
            on(self.south_east_yellow),
            on(self.south_east_red),
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
