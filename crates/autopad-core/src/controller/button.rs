//! Button flags in wire order.

use bitflags::bitflags;

bitflags! {
    /// The 14 controller buttons as a bit mask.
    ///
    /// Bit positions are the wire positions: the serializer shifts the whole
    /// mask left by two, so `A` ends up at bit 2 of the encoded field. Any
    /// subset of flags is a valid chord; there is no mutual exclusion.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u16 {
        const A       = 0x0001;
        const B       = 0x0002;
        const X       = 0x0004;
        const Y       = 0x0008;
        const L       = 0x0010;
        const R       = 0x0020;
        const ZL      = 0x0040;
        const ZR      = 0x0080;
        const MINUS   = 0x0100;
        const PLUS    = 0x0200;
        const L_STICK = 0x0400;
        const R_STICK = 0x0800;
        const HOME    = 0x1000;
        const CAPTURE = 0x2000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_order_matches_protocol() {
        assert_eq!(Buttons::A.bits(), 1);
        assert_eq!(Buttons::B.bits(), 2);
        assert_eq!(Buttons::CAPTURE.bits(), 0x2000);
        // All 14 flags fit below the two reserved low wire bits after << 2.
        assert_eq!(Buttons::all().bits(), 0x3fff);
    }

    #[test]
    fn chords_are_plain_unions() {
        let chord = Buttons::A | Buttons::B | Buttons::HOME;
        assert!(chord.contains(Buttons::A));
        assert_eq!(chord.bits(), 0x1003);
    }
}
