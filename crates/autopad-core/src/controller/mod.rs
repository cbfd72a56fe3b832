//! Controller domain model: buttons, hat, sticks, and the aggregate state.

pub mod button;
pub mod hat;
pub mod state;
pub mod stick;

pub use button::Buttons;
pub use hat::Hat;
pub use state::{ControllerState, StickSide};
pub use stick::{CENTER_X, CENTER_Y, StickPosition, Tilt, clamp_axis, polar_to_xy};
