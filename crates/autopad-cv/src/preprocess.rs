//! Frame preprocessing pipeline.
//!
//! Every stage allocates a new buffer; source frames are never mutated, so a
//! caller can keep reusing one capture buffer across calls. The pipeline is
//! crop → color stage (grayscale / HSV mask / keep) → optional fixed
//! threshold. The interframe-difference binarizer is a separate operation
//! for motion detection over three consecutive frames.

use image::{DynamicImage, GrayImage, Luma, Rgb};
use serde::{Deserialize, Serialize};

use crate::crop::{CropRect, CropSpec};

/// An OpenCV-convention HSV value: hue 0–179, saturation/value 0–255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Inclusive HSV bounds for mask binarization. A `lower.h` greater than
/// `upper.h` selects the hue range wrapping through red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

/// The mutually exclusive second pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorStage {
    /// Convert to 8-bit grayscale (the default for template matching).
    Grayscale,
    /// Produce a binary mask of pixels inside an HSV range.
    BinarizeHsv(HsvRange),
    /// Leave the frame untouched.
    Keep,
}

impl Default for ColorStage {
    fn default() -> Self {
        ColorStage::Grayscale
    }
}

/// Full pipeline configuration, serializable for script sidecar files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default)]
    pub crop: Option<CropSpec>,
    #[serde(default)]
    pub stage: ColorStage,
    #[serde(default)]
    pub binarize_threshold: Option<u8>,
}

/// Runs the configured pipeline over a frame.
pub fn preprocess(src: &DynamicImage, config: &PreprocessConfig) -> DynamicImage {
    let cropped = match &config.crop {
        Some(spec) => crop(src, &spec.rect()),
        None => src.clone(),
    };
    let staged = match &config.stage {
        ColorStage::Grayscale => DynamicImage::ImageLuma8(grayscale(&cropped)),
        ColorStage::BinarizeHsv(range) => DynamicImage::ImageLuma8(binarize_by_hsv(&cropped, range)),
        ColorStage::Keep => cropped,
    };
    match config.binarize_threshold {
        Some(threshold) => {
            DynamicImage::ImageLuma8(binarize_by_threshold(&staged.to_luma8(), threshold))
        }
        None => staged,
    }
}

/// Extracts a rectangle, clamped to the frame bounds. Degenerate rectangles
/// produce an empty image rather than a panic.
pub fn crop(src: &DynamicImage, rect: &CropRect) -> DynamicImage {
    // Intersect the requested region with the frame; negative sizes
    // collapse to an empty strip.
    let x0 = rect.x.clamp(0, src.width() as i32);
    let y0 = rect.y.clamp(0, src.height() as i32);
    let x1 = rect.x.saturating_add(rect.width).clamp(x0, src.width() as i32);
    let y1 = rect
        .y
        .saturating_add(rect.height)
        .clamp(y0, src.height() as i32);
    src.crop_imm(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
}

/// 8-bit grayscale conversion.
pub fn grayscale(src: &DynamicImage) -> GrayImage {
    src.to_luma8()
}

fn rgb_to_hsv(Rgb([r, g, b]): Rgb<u8>) -> Hsv {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

    Hsv {
        h: (h / 2.0).round().min(179.0) as u8,
        s: s.round() as u8,
        v: max as u8,
    }
}

/// Binary mask of pixels whose HSV value lies inside the inclusive range.
pub fn binarize_by_hsv(src: &DynamicImage, range: &HsvRange) -> GrayImage {
    let rgb = src.to_rgb8();
    let mut mask = GrayImage::new(rgb.width(), rgb.height());
    for (out, pixel) in mask.pixels_mut().zip(rgb.pixels()) {
        let hsv = rgb_to_hsv(*pixel);
        let hue_ok = if range.lower.h <= range.upper.h {
            range.lower.h <= hsv.h && hsv.h <= range.upper.h
        } else {
            // Wrap-around range through red.
            hsv.h >= range.lower.h || hsv.h <= range.upper.h
        };
        let inside = hue_ok
            && range.lower.s <= hsv.s
            && hsv.s <= range.upper.s
            && range.lower.v <= hsv.v
            && hsv.v <= range.upper.v;
        *out = Luma([if inside { 255 } else { 0 }]);
    }
    mask
}

/// Fixed-threshold binarization: strictly greater than `threshold` → 255.
pub fn binarize_by_threshold(src: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = GrayImage::new(src.width(), src.height());
    for (dst, Luma([v])) in out.pixels_mut().zip(src.pixels()) {
        *dst = Luma([if *v > threshold { 255 } else { 0 }]);
    }
    out
}

fn absdiff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut out = GrayImage::new(a.width(), a.height());
    for ((dst, Luma([pa])), Luma([pb])) in out.pixels_mut().zip(a.pixels()).zip(b.pixels()) {
        *dst = Luma([pa.abs_diff(*pb)]);
    }
    out
}

/// 3×3 median filter with clamped borders.
fn median3x3(src: &GrayImage) -> GrayImage {
    let (width, height) = src.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }
    for y in 0..height {
        for x in 0..width {
            let mut window = [0u8; 9];
            let mut i = 0;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let sx = (i64::from(x) + dx).clamp(0, i64::from(width) - 1) as u32;
                    let sy = (i64::from(y) + dy).clamp(0, i64::from(height) - 1) as u32;
                    window[i] = src.get_pixel(sx, sy).0[0];
                    i += 1;
                }
            }
            window.sort_unstable();
            out.put_pixel(x, y, Luma([window[4]]));
        }
    }
    out
}

/// Motion mask from three consecutive frames:
/// `|f1 − f2| AND |f2 − f3|`, thresholded, then median-filtered to suppress
/// single-pixel sensor noise. Frames must share dimensions.
pub fn interframe_diff(
    frame1: &GrayImage,
    frame2: &GrayImage,
    frame3: &GrayImage,
    threshold: u8,
) -> GrayImage {
    let d1 = absdiff(frame1, frame2);
    let d2 = absdiff(frame2, frame3);
    let mut combined = GrayImage::new(d1.width(), d1.height());
    for ((dst, Luma([a])), Luma([b])) in combined.pixels_mut().zip(d1.pixels()).zip(d2.pixels()) {
        *dst = Luma([a & b]);
    }
    median3x3(&binarize_by_threshold(&combined, threshold))
}
