//! Wire-protocol encoding and the controller session.
//!
//! One controller update is one text line:
//!
//! ```text
//! <buttons_hex> <hat_decimal> [<lx_hex> <ly_hex>] [<rx_hex> <ry_hex>]
//! ```
//!
//! `buttons_hex` is a `0x`-prefixed 16-bit field: bit 1 flags a left-stick
//! payload, bit 0 a right-stick payload, and the button mask sits above them
//! (shifted left by 2). Stick coordinates are bare lowercase hex bytes and
//! are present only for sticks that changed since the previous send.

use anyhow::Result;
use log::trace;

use crate::controller::ControllerState;

/// Encodes a state snapshot into one wire line (no terminator).
///
/// Serialization is the commit point: after encoding, both sticks' dirty
/// flags are cleared regardless of whether they were included, so the next
/// line omits any stick that does not change again in between.
pub fn serialize(state: &mut ControllerState) -> String {
    let mut header = state.buttons.bits() << 2;
    let mut fields: Vec<String> = Vec::with_capacity(6);

    if state.lstick.is_dirty() {
        header |= 0x2;
    }
    if state.rstick.is_dirty() {
        header |= 0x1;
    }

    fields.push(format!("{header:#06x}"));
    fields.push(state.hat.to_wire().to_string());
    if state.lstick.is_dirty() {
        fields.push(format!("{:x}", state.lstick.x()));
        fields.push(format!("{:x}", state.lstick.y()));
    }
    if state.rstick.is_dirty() {
        fields.push(format!("{:x}", state.rstick.x()));
        fields.push(format!("{:x}", state.rstick.y()));
    }

    state.clean();
    fields.join(" ")
}

/// Capability to push one protocol line toward the microcontroller.
///
/// The serial-port lifecycle lives outside this crate; implementations
/// receive the bare line and are responsible for framing it with CRLF and
/// writing UTF-8 bytes.
pub trait LineSink {
    fn send_line(&mut self, line: &str) -> Result<()>;
}

/// A controller session: one state paired with one transport for its whole
/// lifetime.
#[derive(Debug)]
pub struct Controller<S: LineSink> {
    pub state: ControllerState,
    sink: S,
}

impl<S: LineSink> Controller<S> {
    pub fn new(sink: S) -> Self {
        Self {
            state: ControllerState::new(),
            sink,
        }
    }

    /// Serializes the current state and hands the line to the transport.
    pub fn send_state(&mut self) -> Result<()> {
        let line = serialize(&mut self.state);
        trace!("send: {line}");
        self.sink.send_line(&line)
    }

    /// Consumes the session, returning the transport.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// In-memory transport that records every framed line. Used by tests and
/// the demo binary in place of a real serial port.
#[derive(Debug, Default)]
pub struct MockSink {
    pub lines: Vec<String>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineSink for MockSink {
    fn send_line(&mut self, line: &str) -> Result<()> {
        // Real transports write `line + CRLF` as UTF-8; keep the framing
        // visible so tests can assert on it.
        self.lines.push(format!("{line}\r\n"));
        Ok(())
    }
}
