//! Hat (d-pad) direction.

use serde::{Deserialize, Serialize};

/// Eight compass directions plus neutral. Exactly one value is active at a
/// time; the discriminants are the wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Hat {
    Top = 0,
    TopRight = 1,
    Right = 2,
    BottomRight = 3,
    Bottom = 4,
    BottomLeft = 5,
    Left = 6,
    TopLeft = 7,
    #[default]
    Neutral = 8,
}

impl Hat {
    /// Wire value, 0..=8.
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values() {
        assert_eq!(Hat::Top.to_wire(), 0);
        assert_eq!(Hat::TopLeft.to_wire(), 7);
        assert_eq!(Hat::Neutral.to_wire(), 8);
        assert_eq!(Hat::default(), Hat::Neutral);
    }
}
