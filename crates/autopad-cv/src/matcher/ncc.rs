//! Normalized-correlation support math shared by both backends.
//!
//! Window sums come from integral images (J.P. Lewis' fast-NCC
//! formulation), so normalizing a whole score field costs O(pixels)
//! regardless of template size.

use image::{ImageBuffer, Luma};

/// Single-channel f32 buffer, the common currency of the matchers.
pub(crate) type LumaF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

const DENOM_EPSILON: f64 = 1e-12;

/// Per-window sums of pixel values and squared pixel values over every
/// template-sized window of an image.
pub(crate) struct WindowStats {
    pub out_w: u32,
    pub out_h: u32,
    sums: Vec<f64>,
    sq_sums: Vec<f64>,
}

impl WindowStats {
    /// `None` when the template does not fit inside the image.
    pub fn build(image: &LumaF32, template_w: u32, template_h: u32) -> Option<Self> {
        let (w, h) = image.dimensions();
        if template_w == 0 || template_h == 0 || template_w > w || template_h > h {
            return None;
        }

        // Integral images with a zero top row / left column.
        let stride = (w + 1) as usize;
        let mut integral = vec![0f64; stride * (h + 1) as usize];
        let mut sq_integral = vec![0f64; stride * (h + 1) as usize];
        let data = image.as_raw();
        for y in 0..h as usize {
            let mut row_sum = 0f64;
            let mut row_sq = 0f64;
            for x in 0..w as usize {
                let v = f64::from(data[y * w as usize + x]);
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                integral[idx] = integral[idx - stride] + row_sum;
                sq_integral[idx] = sq_integral[idx - stride] + row_sq;
            }
        }

        let out_w = w - template_w + 1;
        let out_h = h - template_h + 1;
        let mut sums = Vec::with_capacity((out_w * out_h) as usize);
        let mut sq_sums = Vec::with_capacity((out_w * out_h) as usize);
        let (tw, th) = (template_w as usize, template_h as usize);
        for y in 0..out_h as usize {
            for x in 0..out_w as usize {
                let a = y * stride + x;
                let b = y * stride + x + tw;
                let c = (y + th) * stride + x;
                let d = (y + th) * stride + x + tw;
                sums.push(integral[d] - integral[b] - integral[c] + integral[a]);
                sq_sums.push(sq_integral[d] - sq_integral[b] - sq_integral[c] + sq_integral[a]);
            }
        }

        Some(Self {
            out_w,
            out_h,
            sums,
            sq_sums,
        })
    }

    pub fn sum(&self, idx: usize) -> f64 {
        self.sums[idx]
    }

    pub fn sq_sum(&self, idx: usize) -> f64 {
        self.sq_sums[idx]
    }
}

/// Sum and squared sum of a template.
pub(crate) fn template_stats(template: &LumaF32) -> (f64, f64) {
    template.as_raw().iter().fold((0f64, 0f64), |(s, sq), &v| {
        let v = f64::from(v);
        (s + v, sq + v * v)
    })
}

/// Normalizes one raw cross-correlation value into the mean-shifted NCC
/// (`TM_CCOEFF_NORMED`) score for its window. Zero-variance windows score 0.
pub(crate) fn normalize_ccoeff(
    cross: f64,
    window_sum: f64,
    window_sq_sum: f64,
    template_sum: f64,
    template_sq_sum: f64,
    n: f64,
) -> f32 {
    let numerator = cross - window_sum * template_sum / n;
    // Variances are mathematically non-negative; integral-image rounding can
    // leave tiny negative residues that would turn the sqrt into NaN.
    let window_var = (window_sq_sum - window_sum * window_sum / n).max(0.0);
    let template_var = (template_sq_sum - template_sum * template_sum / n).max(0.0);
    let denominator = (window_var * template_var).sqrt();
    if denominator <= DENOM_EPSILON {
        0.0
    } else {
        (numerator / denominator) as f32
    }
}

/// Index and value of the field maximum; the first occurrence wins on ties.
pub(crate) fn argmax(field: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in field.iter().enumerate() {
        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((idx, value)),
        }
    }
    best
}
