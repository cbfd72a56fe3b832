//! Crop-rectangle normalization.
//!
//! Recorded automation scripts describe crop regions in eight historical
//! conventions, identified by an integer code. Codes 1–4 order coordinates
//! x-before-y; codes 11–14 mirror them y-before-x (row-major buffer
//! convention). Each code is either `(start, end)` or `(start, size)` per
//! axis. The code table is frozen: existing scripts depend on it.

use serde::{Deserialize, Serialize};

/// Canonical crop rectangle, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CropRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A crop region as scripts record it: a format code plus four coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSpec {
    pub format: i32,
    pub values: [i32; 4],
}

impl CropSpec {
    pub fn rect(&self) -> CropRect {
        parse_crop(self.format, self.values)
    }
}

/// Converts any supported crop convention into a [`CropRect`].
///
/// | code | layout                | code | layout                |
/// |------|-----------------------|------|-----------------------|
/// | 1    | `[x0, y0, x1, y1]`    | 11   | `[y0, x0, y1, x1]`    |
/// | 2    | `[x0, y0, w, h]`      | 12   | `[y0, x0, h, w]`      |
/// | 3    | `[x0, x1, y0, y1]`    | 13   | `[y0, y1, x0, x1]`    |
/// | 4    | `[x0, w, y0, h]`      | 14   | `[y0, h, x0, w]`      |
///
/// An unrecognized code is NOT clamped to the nearest convention and is NOT
/// an error: the four values are passed through unchanged as `(x, y, w, h)`.
/// This mirrors the behavior recorded scripts were written against. It is a
/// suspected latent bug upstream — a caller passing a bogus code gets a
/// silently misinterpreted rectangle — but changing it would break replay
/// compatibility.
pub fn parse_crop(format: i32, values: [i32; 4]) -> CropRect {
    let [a, b, c, d] = values;
    match format {
        1 => CropRect::new(a, b, c - a, d - b),
        2 => CropRect::new(a, b, c, d),
        3 => CropRect::new(a, c, b - a, d - c),
        4 => CropRect::new(a, c, b, d),
        11 => CropRect::new(b, a, d - b, c - a),
        12 => CropRect::new(b, a, d, c),
        13 => CropRect::new(c, a, d - c, b - a),
        14 => CropRect::new(c, a, d, b),
        // Deliberate pass-through, see the doc comment above.
        _ => CropRect::new(a, b, c, d),
    }
}

/// Inverse of [`parse_crop`]: expresses a rectangle in the given convention.
/// Returns `None` for unknown codes.
pub fn encode_crop(rect: &CropRect, format: i32) -> Option<[i32; 4]> {
    let CropRect {
        x,
        y,
        width: w,
        height: h,
    } = *rect;
    match format {
        1 => Some([x, y, x + w, y + h]),
        2 => Some([x, y, w, h]),
        3 => Some([x, x + w, y, y + h]),
        4 => Some([x, w, y, h]),
        11 => Some([y, x, y + h, x + w]),
        12 => Some([y, x, h, w]),
        13 => Some([y, y + h, x, x + w]),
        14 => Some([y, h, x, w]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT: CropRect = CropRect {
        x: 10,
        y: 20,
        width: 30,
        height: 40,
    };

    #[test]
    fn all_codes_round_trip() {
        for format in [1, 2, 3, 4, 11, 12, 13, 14] {
            let values = encode_crop(&RECT, format).unwrap();
            assert_eq!(parse_crop(format, values), RECT, "format {format}");
        }
    }

    #[test]
    fn code_table_is_exact() {
        assert_eq!(parse_crop(1, [10, 20, 40, 60]), RECT);
        assert_eq!(parse_crop(2, [10, 20, 30, 40]), RECT);
        assert_eq!(parse_crop(3, [10, 40, 20, 60]), RECT);
        assert_eq!(parse_crop(4, [10, 30, 20, 40]), RECT);
        assert_eq!(parse_crop(11, [20, 10, 60, 40]), RECT);
        assert_eq!(parse_crop(12, [20, 10, 40, 30]), RECT);
        assert_eq!(parse_crop(13, [20, 60, 10, 40]), RECT);
        assert_eq!(parse_crop(14, [20, 40, 10, 30]), RECT);
    }

    #[test]
    fn unknown_code_passes_values_through() {
        let values = [7, 8, 9, 10];
        let rect = parse_crop(99, values);
        assert_eq!(rect, CropRect::new(7, 8, 9, 10));
        assert_eq!(parse_crop(0, values), CropRect::new(7, 8, 9, 10));
        assert_eq!(encode_crop(&rect, 99), None);
    }

    #[test]
    fn spec_resolves_through_parse() {
        let spec = CropSpec {
            format: 13,
            values: [20, 60, 10, 40],
        };
        assert_eq!(spec.rect(), RECT);
    }
}
