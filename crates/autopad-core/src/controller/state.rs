//! Aggregate controller state.

use serde::{Deserialize, Serialize};

use super::button::Buttons;
use super::hat::Hat;
use super::stick::{StickPosition, Tilt};

/// Which analog stick an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickSide {
    Left,
    Right,
}

/// The full virtual-controller state: button mask, hat, and both sticks.
///
/// Created once per session and mutated by the automation loop; the
/// serializer reads it, encodes a wire line, and clears the sticks' dirty
/// flags. Single-owner: no internal synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub buttons: Buttons,
    pub hat: Hat,
    pub lstick: StickPosition,
    pub rstick: StickPosition,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// ORs the given buttons into the mask. Idempotent.
    pub fn push_buttons(&mut self, buttons: Buttons) {
        self.buttons |= buttons;
    }

    /// Removes the given buttons from the mask. Idempotent.
    pub fn release_buttons(&mut self, buttons: Buttons) {
        self.buttons &= !buttons;
    }

    /// Replaces the hat value unconditionally.
    pub fn set_hat(&mut self, hat: Hat) {
        self.hat = hat;
    }

    fn stick_mut(&mut self, side: StickSide) -> &mut StickPosition {
        match side {
            StickSide::Left => &mut self.lstick,
            StickSide::Right => &mut self.rstick,
        }
    }

    pub fn stick(&self, side: StickSide) -> &StickPosition {
        match side {
            StickSide::Left => &self.lstick,
            StickSide::Right => &self.rstick,
        }
    }

    pub fn set_stick_xy(&mut self, side: StickSide, x: i32, y: i32) {
        self.stick_mut(side).set_xy(x, y);
    }

    pub fn tilt_stick_polar(&mut self, side: StickSide, radius: f64, degrees: f64) {
        self.stick_mut(side).tilt_polar(radius, degrees);
    }

    pub fn tilt_stick_preset(&mut self, side: StickSide, tilt: Tilt) {
        self.stick_mut(side).tilt_preset(tilt);
    }

    pub fn negate_stick_tilt(&mut self, side: StickSide, tilts: Tilt) {
        self.stick_mut(side).negate(tilts);
    }

    /// Returns everything to rest: empty buttons, neutral hat, centered
    /// sticks. Sticks that were off-center become dirty.
    pub fn reset(&mut self) {
        self.buttons = Buttons::empty();
        self.hat = Hat::Neutral;
        self.lstick.to_neutral();
        self.rstick.to_neutral();
    }

    /// Clears both sticks' dirty flags without moving them. Called by the
    /// serializer after encoding.
    pub fn clean(&mut self) {
        self.lstick.clean();
        self.rstick.clean();
    }
}
