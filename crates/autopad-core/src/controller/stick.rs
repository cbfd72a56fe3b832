//! Analog stick geometry and position tracking.
//!
//! Coordinates are 8-bit with the y axis pointing down: `(255, 127)` is full
//! right, `(128, 0)` is full up. The rest position is `(128, 127)`.

use std::sync::OnceLock;

use bitflags::bitflags;

/// Resting x coordinate.
pub const CENTER_X: u8 = 128;
/// Resting y coordinate.
pub const CENTER_Y: u8 = 127;

bitflags! {
    /// Stick deflection directions, used both as preset-table indices and as
    /// cancellation sets for [`StickPosition::negate`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Tilt: u8 {
        const TOP    = 0b0001;
        const RIGHT  = 0b0010;
        const BOTTOM = 0b0100;
        const LEFT   = 0b1000;
    }
}

/// Clamps a coordinate to `[0, 255]`, flooring fractional input.
pub fn clamp_axis(value: f64) -> u8 {
    if value < 0.0 {
        0
    } else if value > 255.0 {
        255
    } else {
        value.floor() as u8
    }
}

/// Converts polar stick input to clamped Cartesian coordinates.
///
/// A negative radius is folded into the angle (`+180°`) before the radius is
/// clamped to `[0.0, 1.0]`; the angle is normalized to `[0, 360)`. The
/// asymmetric rounding (ceil for x, floor for y) is part of the wire-level
/// contract: presets generated from this function must keep producing the
/// exact historical coordinates.
pub fn polar_to_xy(radius: f64, degrees: f64) -> (u8, u8) {
    let (radius, degrees) = if radius < 0.0 {
        (-radius, degrees + 180.0)
    } else {
        (radius, degrees)
    };
    let r = radius.clamp(0.0, 1.0);
    let theta = degrees.rem_euclid(360.0).to_radians();
    // y axis points down, so the sine term is negated.
    let x = (127.5 * theta.cos() * r + 127.5).ceil();
    let y = (127.5 * -theta.sin() * r + 127.5).floor();
    (clamp_axis(x), clamp_axis(y))
}

/// Full-deflection coordinates for every `Tilt` combination.
///
/// Contradictory combinations (TOP|BOTTOM, LEFT|RIGHT and any superset of
/// either) resolve to neutral.
fn preset_table() -> &'static [(u8, u8); 16] {
    static TABLE: OnceLock<[(u8, u8); 16]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let neutral = (CENTER_X, CENTER_Y);
        let mut table = [neutral; 16];
        let angles = [
            (Tilt::TOP, 90.0),
            (Tilt::TOP | Tilt::RIGHT, 45.0),
            (Tilt::RIGHT, 0.0),
            (Tilt::BOTTOM | Tilt::RIGHT, 315.0),
            (Tilt::BOTTOM, 270.0),
            (Tilt::BOTTOM | Tilt::LEFT, 225.0),
            (Tilt::LEFT, 180.0),
            (Tilt::TOP | Tilt::LEFT, 135.0),
        ];
        for (tilt, degrees) in angles {
            table[tilt.bits() as usize] = polar_to_xy(1.0, degrees);
        }
        table
    })
}

/// Looks up the precomputed full-deflection position for a tilt combination.
pub fn preset_xy(tilt: Tilt) -> (u8, u8) {
    preset_table()[tilt.bits() as usize]
}

/// One analog stick with change tracking.
///
/// `dirty` means "changed since the last wire transmission"; the serializer
/// omits clean sticks from the encoded line and clears the flag on send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickPosition {
    x: u8,
    y: u8,
    dirty: bool,
}

impl Default for StickPosition {
    fn default() -> Self {
        Self {
            x: CENTER_X,
            y: CENTER_Y,
            dirty: false,
        }
    }
}

impl StickPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Sets both axes, clamping to `[0, 255]`. Marks the stick dirty only if
    /// the clamped pair differs from the stored pair.
    pub fn set_xy(&mut self, x: i32, y: i32) {
        let x = x.clamp(0, 255) as u8;
        let y = y.clamp(0, 255) as u8;
        if self.x != x || self.y != y {
            self.x = x;
            self.y = y;
            self.dirty = true;
        }
    }

    /// Tilts via polar coordinates, then behaves like [`set_xy`](Self::set_xy).
    pub fn tilt_polar(&mut self, radius: f64, degrees: f64) {
        let (x, y) = polar_to_xy(radius, degrees);
        self.set_xy(i32::from(x), i32::from(y));
    }

    /// Tilts to the preset position for a direction combination.
    pub fn tilt_preset(&mut self, tilt: Tilt) {
        let (x, y) = preset_xy(tilt);
        self.set_xy(i32::from(x), i32::from(y));
    }

    /// Returns the stick to rest.
    pub fn to_neutral(&mut self) {
        self.set_xy(i32::from(CENTER_X), i32::from(CENTER_Y));
    }

    /// Cancels the given deflection directions without touching the
    /// orthogonal axis: an axis snaps back to center only if it is currently
    /// deflected in a flagged direction.
    pub fn negate(&mut self, tilts: Tilt) {
        let mut x = self.x;
        let mut y = self.y;
        if tilts.contains(Tilt::LEFT) && x < CENTER_X {
            x = CENTER_X;
        }
        if tilts.contains(Tilt::RIGHT) && x > CENTER_X {
            x = CENTER_X;
        }
        if tilts.contains(Tilt::TOP) && y < CENTER_Y {
            y = CENTER_Y;
        }
        if tilts.contains(Tilt::BOTTOM) && y > CENTER_Y {
            y = CENTER_Y;
        }
        self.set_xy(i32::from(x), i32::from(y));
    }

    /// Current deflection directions (inverse of [`negate`](Self::negate)).
    pub fn tilting(&self) -> Tilt {
        let mut tilts = Tilt::empty();
        if self.x < CENTER_X {
            tilts |= Tilt::LEFT;
        } else if self.x > CENTER_X {
            tilts |= Tilt::RIGHT;
        }
        if self.y < CENTER_Y {
            tilts |= Tilt::TOP;
        } else if self.y > CENTER_Y {
            tilts |= Tilt::BOTTOM;
        }
        tilts
    }

    /// Clears the dirty flag without altering the position. Idempotent;
    /// called by the serializer after a send.
    pub fn clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinal_directions_are_exact() {
        assert_eq!(polar_to_xy(1.0, 0.0), (255, 127));
        assert_eq!(polar_to_xy(1.0, 90.0), (128, 0));
        assert_eq!(polar_to_xy(1.0, 180.0), (0, 127));
        assert_eq!(polar_to_xy(1.0, 270.0), (128, 255));
    }

    #[test]
    fn zero_radius_is_center_for_any_angle() {
        for degrees in [0.0, 33.0, 90.0, 181.5, 359.9, -720.0] {
            assert_eq!(polar_to_xy(0.0, degrees), (CENTER_X, CENTER_Y));
        }
    }

    #[test]
    fn output_is_always_in_range() {
        let mut degrees = -360.0;
        while degrees < 720.0 {
            for r in [0.0, 0.25, 0.5, 1.0, 2.5, -1.0] {
                let (x, y) = polar_to_xy(r, degrees);
                // u8 return type already proves the range; pin the diagonal
                // rounding down instead.
                if r == 1.0 && degrees == 45.0 {
                    assert_eq!((x, y), (218, 37));
                }
                let _ = (x, y);
            }
            degrees += 7.5;
        }
    }

    #[test]
    fn negative_radius_flips_direction() {
        assert_eq!(polar_to_xy(-1.0, 0.0), polar_to_xy(1.0, 180.0));
        assert_eq!(polar_to_xy(-1.0, 90.0), polar_to_xy(1.0, 270.0));
    }

    #[test]
    fn clamp_floors_fractional_input() {
        assert_eq!(clamp_axis(12.9), 12);
        assert_eq!(clamp_axis(-3.0), 0);
        assert_eq!(clamp_axis(300.0), 255);
        assert_eq!(clamp_axis(255.0), 255);
    }

    #[test]
    fn contradictory_presets_are_neutral() {
        let neutral = (CENTER_X, CENTER_Y);
        assert_eq!(preset_xy(Tilt::empty()), neutral);
        assert_eq!(preset_xy(Tilt::TOP | Tilt::BOTTOM), neutral);
        assert_eq!(preset_xy(Tilt::LEFT | Tilt::RIGHT), neutral);
        assert_eq!(preset_xy(Tilt::TOP | Tilt::BOTTOM | Tilt::LEFT), neutral);
        assert_eq!(preset_xy(Tilt::all()), neutral);
    }

    #[test]
    fn valid_presets_match_polar() {
        assert_eq!(preset_xy(Tilt::TOP), (128, 0));
        assert_eq!(preset_xy(Tilt::RIGHT), (255, 127));
        assert_eq!(preset_xy(Tilt::TOP | Tilt::RIGHT), polar_to_xy(1.0, 45.0));
        assert_eq!(
            preset_xy(Tilt::BOTTOM | Tilt::LEFT),
            polar_to_xy(1.0, 225.0)
        );
    }

    #[test]
    fn set_xy_round_trips_and_tracks_dirt() {
        let mut stick = StickPosition::new();
        assert!(!stick.is_dirty());

        stick.set_xy(300, -20);
        assert_eq!((stick.x(), stick.y()), (255, 0));
        assert!(stick.is_dirty());

        stick.clean();
        stick.set_xy(255, 0); // same clamped value, no new dirt
        assert!(!stick.is_dirty());
    }

    #[test]
    fn clean_is_idempotent() {
        let mut stick = StickPosition::new();
        stick.set_xy(0, 0);
        stick.clean();
        stick.clean();
        assert!(!stick.is_dirty());
        assert_eq!((stick.x(), stick.y()), (0, 0));
    }

    #[test]
    fn negate_only_cancels_matching_directions() {
        let mut stick = StickPosition::new();
        stick.tilt_preset(Tilt::TOP | Tilt::RIGHT);
        assert_eq!(stick.tilting(), Tilt::TOP | Tilt::RIGHT);

        // Cancelling TOP leaves the rightward deflection alone.
        stick.negate(Tilt::TOP);
        assert_eq!(stick.y(), CENTER_Y);
        assert_eq!(stick.x(), 218);
        assert_eq!(stick.tilting(), Tilt::RIGHT);

        // Cancelling a direction the stick is not deflected in is a no-op.
        stick.clean();
        stick.negate(Tilt::LEFT | Tilt::BOTTOM);
        assert!(!stick.is_dirty());
    }
}
