//! Template matchers.
//!
//! Two independent backends implement one capability contract: the CPU
//! backend always initializes and supports masks; the GPU backend rides the
//! `template-matching` (wgpu) crate, can fail to initialize on machines
//! without an adapter, and ignores masks. [`Matcher::with_preferred`] is the
//! factory that picks a backend and silently falls back to the CPU.

pub mod cpu;
pub mod gpu;
mod ncc;

pub use cpu::CpuMatcher;
pub use gpu::GpuMatcher;

use image::DynamicImage;
use log::warn;

/// Stable argmax over a score list; the first occurrence wins on ties.
pub fn stable_argmax(values: &[f32]) -> Option<(usize, f32)> {
    ncc::argmax(values)
}

/// Outcome snapshot of one match call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Whether the best score cleared the threshold.
    pub contains: bool,
    /// Top-left corner of the best-scoring window.
    pub location: (u32, u32),
    /// Template width after preprocessing.
    pub width: u32,
    /// Template height after preprocessing.
    pub height: u32,
    /// The best similarity score.
    pub value: f32,
}

/// Which backend a matcher runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherMode {
    Cpu,
    Gpu,
}

/// Backend capability contract shared by [`CpuMatcher`] and [`GpuMatcher`].
pub trait TemplateMatch {
    fn mode(&self) -> MatcherMode;
    /// False only for a hardware backend whose context acquisition failed.
    /// Initialization failure is terminal for the instance.
    fn is_initialized(&self) -> bool;
    /// True when both image and template are set (and the backend is
    /// initialized).
    fn is_ready(&self) -> bool;
    /// Computes the similarity field and extracts the global maximum.
    /// `None` when not ready; never an error.
    fn best_match(&mut self) -> Option<MatchResult>;
}

/// Runtime-selected matcher backend.
#[derive(Debug)]
pub enum Matcher {
    Cpu(CpuMatcher),
    Gpu(GpuMatcher),
}

impl Matcher {
    /// Builds a matcher for the preferred mode. A GPU request falls back to
    /// the CPU backend when the hardware context cannot be acquired; the
    /// fallback is logged, never surfaced as an error.
    pub fn with_preferred(mode: MatcherMode) -> Self {
        match mode {
            MatcherMode::Cpu => Matcher::Cpu(CpuMatcher::new()),
            MatcherMode::Gpu => Self::from_gpu(GpuMatcher::initialize()),
        }
    }

    /// Wraps an already-initialized GPU backend, or falls back to CPU.
    pub(crate) fn from_gpu(gpu: Option<GpuMatcher>) -> Self {
        match gpu {
            Some(gpu) => Matcher::Gpu(gpu),
            None => {
                warn!("gpu matcher unavailable, falling back to cpu");
                Matcher::Cpu(CpuMatcher::new())
            }
        }
    }

    pub fn set_image(&mut self, image: Option<&DynamicImage>) -> &mut Self {
        match self {
            Matcher::Cpu(m) => {
                m.set_image(image);
            }
            Matcher::Gpu(m) => {
                m.set_image(image);
            }
        }
        self
    }

    pub fn set_template(&mut self, template: Option<&DynamicImage>) -> &mut Self {
        match self {
            Matcher::Cpu(m) => {
                m.set_template(template);
            }
            Matcher::Gpu(m) => {
                m.set_template(template);
            }
        }
        self
    }

    /// Sets the optional mask. The GPU backend ignores masks (documented
    /// limitation of the accelerated path).
    pub fn set_mask(&mut self, mask: Option<&DynamicImage>) -> &mut Self {
        match self {
            Matcher::Cpu(m) => {
                m.set_mask(mask);
            }
            Matcher::Gpu(m) => {
                m.set_mask(mask);
            }
        }
        self
    }

    pub fn set_threshold(&mut self, threshold: f32) -> &mut Self {
        match self {
            Matcher::Cpu(m) => {
                m.set_threshold(threshold);
            }
            Matcher::Gpu(m) => {
                m.set_threshold(threshold);
            }
        }
        self
    }
}

impl TemplateMatch for Matcher {
    fn mode(&self) -> MatcherMode {
        match self {
            Matcher::Cpu(m) => m.mode(),
            Matcher::Gpu(m) => m.mode(),
        }
    }

    fn is_initialized(&self) -> bool {
        match self {
            Matcher::Cpu(m) => m.is_initialized(),
            Matcher::Gpu(m) => m.is_initialized(),
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            Matcher::Cpu(m) => m.is_ready(),
            Matcher::Gpu(m) => m.is_ready(),
        }
    }

    fn best_match(&mut self) -> Option<MatchResult> {
        match self {
            Matcher::Cpu(m) => m.best_match(),
            Matcher::Gpu(m) => m.best_match(),
        }
    }
}
