//! Accelerated (GPU) template matcher.
//!
//! Rides the `template-matching` crate, which runs the sliding-window sum on
//! a wgpu compute pipeline. The crate offers no normalized metric, so the
//! on-device result is the raw sum of squared differences; the backend
//! converts that field into the same mean-shifted NCC scores the CPU backend
//! produces (`cc = (ΣI² + ΣT² − SSD) / 2`, then integral-image
//! normalization), keeping one threshold scale across backends.
//!
//! Limitations relative to the CPU backend: masks are ignored, and a machine
//! without a usable adapter fails initialization once and permanently.

use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};

use image::DynamicImage;
use log::{debug, warn};
use template_matching::{Image as GpuImage, MatchTemplateMethod, TemplateMatcher as WgpuMatcher};

use super::cpu::DEFAULT_THRESHOLD;
use super::ncc::{self, LumaF32, WindowStats};
use super::{MatchResult, MatcherMode, TemplateMatch};

pub struct GpuMatcher {
    inner: WgpuMatcher,
    image: Option<LumaF32>,
    template: Option<LumaF32>,
    threshold: f32,
    last_result: Option<MatchResult>,
}

impl std::fmt::Debug for GpuMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuMatcher")
            .field("image", &self.image.as_ref().map(LumaF32::dimensions))
            .field("template", &self.template.as_ref().map(LumaF32::dimensions))
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl GpuMatcher {
    /// Acquires the wgpu context. Returns `None` when no adapter is
    /// available; the failure is terminal — construct a new instance (or use
    /// the CPU backend) instead of retrying.
    pub fn initialize() -> Option<Self> {
        // The crate panics rather than erroring when adapter acquisition
        // fails, so the probe runs under catch_unwind.
        let inner = panic::catch_unwind(AssertUnwindSafe(WgpuMatcher::new)).ok()?;
        Some(Self {
            inner,
            image: None,
            template: None,
            threshold: DEFAULT_THRESHOLD,
            last_result: None,
        })
    }

    pub fn set_image(&mut self, image: Option<&DynamicImage>) -> &mut Self {
        self.image = image.map(DynamicImage::to_luma32f);
        self
    }

    pub fn set_template(&mut self, template: Option<&DynamicImage>) -> &mut Self {
        self.template = template.map(DynamicImage::to_luma32f);
        self
    }

    /// Masks are not supported on the accelerated path; a supplied mask is
    /// ignored with a warning, matching is unaffected.
    pub fn set_mask(&mut self, mask: Option<&DynamicImage>) -> &mut Self {
        if mask.is_some() {
            warn!("gpu matcher ignores masks");
        }
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
}

impl TemplateMatch for GpuMatcher {
    fn mode(&self) -> MatcherMode {
        MatcherMode::Gpu
    }

    fn is_initialized(&self) -> bool {
        // Construction only succeeds through `initialize`.
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

        let stats = match WindowStats::build(image, tw, th) {
            Some(stats) => stats,
            None => {
                warn!(
                    "template {tw}x{th} does not fit image {}x{}",
                    image.width(),
                    image.height()
                );
                return None;
            }
        };

        let input = GpuImage::new(
            Cow::Borrowed(image.as_raw().as_slice()),
            image.width(),
            image.height(),
        );
        let tpl = GpuImage::new(Cow::Borrowed(template.as_raw().as_slice()), tw, th);
        self.inner
            .match_template(input, tpl, MatchTemplateMethod::SumOfSquaredDifferences);
        let ssd = self.inner.wait_for_result()?;

        let expected = (stats.out_w * stats.out_h) as usize;
        if ssd.data.len() != expected {
            warn!(
                "unexpected device result size {} (expected {expected})",
                ssd.data.len()
            );
            return None;
        }

        let (t_sum, t_sq_sum) = ncc::template_stats(template);
        let n = f64::from(tw) * f64::from(th);
        let field: Vec<f32> = ssd
            .data
            .iter()
            .enumerate()
            .map(|(idx, &ssd_value)| {
                let cross = (stats.sq_sum(idx) + t_sq_sum - f64::from(ssd_value)) / 2.0;
                ncc::normalize_ccoeff(cross, stats.sum(idx), stats.sq_sum(idx), t_sum, t_sq_sum, n)
            })
            .collect();

        let (idx, value) = ncc::argmax(&field)?;
        let location = (idx as u32 % stats.out_w, idx as u32 / stats.out_w);
        debug!("gpu match: value={value:.4} at {location:?}");
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
