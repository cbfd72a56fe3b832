//! Autopad Controller Core
//!
//! Virtual controller state model and the line-oriented wire protocol that
//! drives a serial-attached microcontroller posing as a USB gamepad.

pub mod controller;
pub mod protocol;

// Re-export commonly used types
pub use controller::{Buttons, ControllerState, Hat, StickPosition, StickSide, Tilt};
pub use protocol::{Controller, LineSink, MockSink, serialize};
