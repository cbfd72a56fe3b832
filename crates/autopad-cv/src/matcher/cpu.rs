//! Default (CPU) template matcher.

use image::DynamicImage;
use log::{debug, warn};

use super::ncc::{self, LumaF32, WindowStats};
use super::{MatchResult, MatcherMode, TemplateMatch};

pub(crate) const DEFAULT_THRESHOLD: f32 = 0.8;

/// Exhaustive normalized-correlation matcher over single-channel buffers.
///
/// Without a mask the metric is mean-shifted NCC (`TM_CCOEFF_NORMED`); with
/// a mask it switches to plain normalized cross-correlation restricted to
/// mask pixels (`TM_CCORR_NORMED`) — coefficient normalization is undefined
/// under a mask. Mask pixels participate when their value is > 0.
#[derive(Debug, Default)]
pub struct CpuMatcher {
    image: Option<LumaF32>,
    template: Option<LumaF32>,
    mask: Option<LumaF32>,
    threshold: f32,
    last_result: Option<MatchResult>,
}

impl CpuMatcher {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            ..Self::default()
        }
    }

    /// Sets (or clears) the source image. Color input is collapsed to luma.
    pub fn set_image(&mut self, image: Option<&DynamicImage>) -> &mut Self {
        self.image = image.map(DynamicImage::to_luma32f);
        self
    }

    /// Sets (or clears) the template.
    pub fn set_template(&mut self, template: Option<&DynamicImage>) -> &mut Self {
        self.template = template.map(DynamicImage::to_luma32f);
        self
    }

    /// Sets (or clears) the mask. Must match the template dimensions to take
    /// effect; a mismatched mask is dropped with a warning at match time.
    pub fn set_mask(&mut self, mask: Option<&DynamicImage>) -> &mut Self {
        self.mask = mask.map(DynamicImage::to_luma32f);
        self
    }

    pub fn set_threshold(&mut self, threshold: f32) -> &mut Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn last_result(&self) -> Option<&MatchResult> {
        self.last_result.as_ref()
    }

    fn ccoeff_field(image: &LumaF32, template: &LumaF32) -> Option<Vec<f32>> {
        let (tw, th) = template.dimensions();
        let stats = WindowStats::build(image, tw, th)?;
        let (t_sum, t_sq_sum) = ncc::template_stats(template);
        let n = f64::from(tw) * f64::from(th);

        let (w, _) = image.dimensions();
        let src = image.as_raw();
        let tpl = template.as_raw();
        let mut field = Vec::with_capacity((stats.out_w * stats.out_h) as usize);
        for wy in 0..stats.out_h as usize {
            for wx in 0..stats.out_w as usize {
                let mut cross = 0f64;
                for ty in 0..th as usize {
                    let row = (wy + ty) * w as usize + wx;
                    let trow = ty * tw as usize;
                    for tx in 0..tw as usize {
                        cross += f64::from(src[row + tx]) * f64::from(tpl[trow + tx]);
                    }
                }
                let idx = field.len();
                field.push(ncc::normalize_ccoeff(
                    cross,
                    stats.sum(idx),
                    stats.sq_sum(idx),
                    t_sum,
                    t_sq_sum,
                    n,
                ));
            }
        }
        Some(field)
    }

    fn masked_ccorr_field(image: &LumaF32, template: &LumaF32, mask: &LumaF32) -> Option<Vec<f32>> {
        let (tw, th) = template.dimensions();
        let (w, h) = image.dimensions();
        if tw == 0 || th == 0 || tw > w || th > h {
            return None;
        }

        let src = image.as_raw();
        let tpl = template.as_raw();
        let msk = mask.as_raw();
        // Masked template energy is window-independent.
        let mut t_energy = 0f64;
        for (t, m) in tpl.iter().zip(msk) {
            if *m > 0.0 {
                t_energy += f64::from(*t) * f64::from(*t);
            }
        }

        let out_w = w - tw + 1;
        let out_h = h - th + 1;
        let mut field = Vec::with_capacity((out_w * out_h) as usize);
        for wy in 0..out_h as usize {
            for wx in 0..out_w as usize {
                let mut cross = 0f64;
                let mut i_energy = 0f64;
                for ty in 0..th as usize {
                    let row = (wy + ty) * w as usize + wx;
                    let trow = ty * tw as usize;
                    for tx in 0..tw as usize {
                        if msk[trow + tx] > 0.0 {
                            let i = f64::from(src[row + tx]);
                            cross += i * f64::from(tpl[trow + tx]);
                            i_energy += i * i;
                        }
                    }
                }
                let denom = (t_energy * i_energy).sqrt();
                field.push(if denom <= 1e-12 {
                    0.0
                } else {
                    (cross / denom) as f32
                });
            }
        }
        Some(field)
    }
}

impl TemplateMatch for CpuMatcher {
    fn mode(&self) -> MatcherMode {
        MatcherMode::Cpu
    }

    fn is_initialized(&self) -> bool {
        true
    }

    fn is_ready(&self) -> bool {
        self.image.is_some() && self.template.is_some()
    }

    fn best_match(&mut self) -> Option<MatchResult> {
        if !self.is_ready() {
            return None;
        }
        let image = self.image.as_ref()?;
        let template = self.template.as_ref()?;
        let (tw, th) = template.dimensions();

        let mask = match &self.mask {
            Some(mask) if mask.dimensions() != template.dimensions() => {
                warn!(
                    "mask dimensions {:?} do not match template {:?}, ignoring mask",
                    mask.dimensions(),
                    template.dimensions()
                );
                None
            }
            other => other.as_ref(),
        };

        let field = match mask {
            Some(mask) => Self::masked_ccorr_field(image, template, mask),
            None => Self::ccoeff_field(image, template),
        };
        let field = match field {
            Some(field) => field,
            None => {
                warn!(
                    "template {tw}x{th} does not fit image {}x{}",
                    image.width(),
                    image.height()
                );
                return None;
            }
        };

        let out_w = image.width() - tw + 1;
        let (idx, value) = ncc::argmax(&field)?;
        let location = (idx as u32 % out_w, idx as u32 / out_w);
        debug!("cpu match: value={value:.4} at {location:?}");
        let result = MatchResult {
            contains: value > self.threshold,
            location,
            width: tw,
            height: th,
            value,
        };
        self.last_result = Some(result);
        Some(result)
    }
}
