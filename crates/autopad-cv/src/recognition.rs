//! Recognition facade: preprocessing plus matching in one call, and
//! best-of-N template selection.

use image::DynamicImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::crop::CropSpec;
use crate::matcher::{MatchResult, Matcher, MatcherMode, TemplateMatch};
use crate::preprocess::{PreprocessConfig, preprocess};

/// Per-call recognition options. Serializable so recorded scripts can carry
/// them as sidecar files (see [`crate::loader`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    #[serde(default = "MatchOptions::default_threshold")]
    pub threshold: f32,
    /// Applied identically to the frame and to every template.
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    /// Templates may carry their own crop region, separate from the frame's.
    #[serde(default)]
    pub template_crop: Option<CropSpec>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: Self::default_threshold(),
            preprocess: PreprocessConfig::default(),
            template_crop: None,
        }
    }
}

impl MatchOptions {
    fn default_threshold() -> f32 {
        0.7
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }
}

/// Result of a best-of-N selection.
///
/// `best` is the stable argmax over `values` (first occurrence wins on
/// ties), independent of the threshold verdicts in `passed`. A mask-count
/// mismatch or an empty template list yields the invalid sentinel: `best`
/// is `None` and every list is empty — callers must check before indexing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiMatchResult {
    pub best: Option<usize>,
    pub values: Vec<f32>,
    pub locations: Vec<(u32, u32)>,
    pub sizes: Vec<(u32, u32)>,
    pub passed: Vec<bool>,
}

impl MultiMatchResult {
    fn invalid() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.best.is_some()
    }
}

/// Owns one matcher backend and runs the preprocess-then-match pipeline.
#[derive(Debug)]
pub struct Recognizer {
    matcher: Matcher,
}

impl Recognizer {
    pub fn new(preferred: MatcherMode) -> Self {
        Self {
            matcher: Matcher::with_preferred(preferred),
        }
    }

    pub fn mode(&self) -> MatcherMode {
        self.matcher.mode()
    }

    fn prepare_template(template: &DynamicImage, options: &MatchOptions) -> DynamicImage {
        let config = PreprocessConfig {
            crop: options.template_crop,
            ..options.preprocess
        };
        preprocess(template, &config)
    }

    /// Preprocesses frame and template identically, matches, and applies the
    /// threshold. `None` means "nothing to report" (unready matcher or a
    /// template that does not fit), not an error.
    pub fn contains_template(
        &mut self,
        frame: &DynamicImage,
        template: &DynamicImage,
        mask: Option<&DynamicImage>,
        options: &MatchOptions,
    ) -> Option<MatchResult> {
        let src = preprocess(frame, &options.preprocess);
        let tpl = Self::prepare_template(template, options);
        self.matcher
            .set_image(Some(&src))
            .set_template(Some(&tpl))
            .set_mask(mask)
            .set_threshold(options.threshold);
        self.matcher.best_match()
    }

    /// Matches the frame against every template, reporting per-template
    /// scores and the index of the best one.
    ///
    /// `masks` must be empty (no masks) or exactly as long as `templates`;
    /// anything else is a hard validation failure returning the invalid
    /// sentinel result.
    pub fn best_of(
        &mut self,
        frame: &DynamicImage,
        templates: &[DynamicImage],
        masks: &[DynamicImage],
        options: &MatchOptions,
    ) -> MultiMatchResult {
        if templates.is_empty() {
            return MultiMatchResult::invalid();
        }
        if !masks.is_empty() && masks.len() != templates.len() {
            warn!(
                "template/mask count mismatch: {} templates, {} masks",
                templates.len(),
                masks.len()
            );
            return MultiMatchResult::invalid();
        }

        // The frame is preprocessed once and reused across templates.
        let src = preprocess(frame, &options.preprocess);
        self.matcher.set_image(Some(&src));
        self.matcher.set_threshold(options.threshold);

        let mut result = MultiMatchResult::default();
        for (idx, template) in templates.iter().enumerate() {
            let tpl = Self::prepare_template(template, options);
            self.matcher
                .set_template(Some(&tpl))
                .set_mask(masks.get(idx));
            match self.matcher.best_match() {
                Some(m) => {
                    result.values.push(m.value);
                    result.locations.push(m.location);
                    result.sizes.push((m.width, m.height));
                    result.passed.push(m.contains);
                }
                None => {
                    // Keep the lists index-aligned with the template list.
                    result.values.push(0.0);
                    result.locations.push((0, 0));
                    result.sizes.push((tpl.width(), tpl.height()));
                    result.passed.push(false);
                }
            }
        }

        result.best = crate::matcher::stable_argmax(&result.values).map(|(idx, _)| idx);
        debug!("best_of: {:?} over {:?}", result.best, result.values);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::CropSpec;
    use image::{GrayImage, Luma};

    fn frame_with_block(x0: u32, y0: u32, value: u8) -> DynamicImage {
        let mut frame = GrayImage::from_pixel(40, 30, Luma([15]));
        for y in y0..y0 + 4 {
            for x in x0..x0 + 4 {
                frame.put_pixel(x, y, Luma([value]));
            }
        }
        DynamicImage::ImageLuma8(frame)
    }

    fn block_template(value: u8) -> DynamicImage {
        let mut tpl = GrayImage::from_pixel(6, 6, Luma([15]));
        for y in 1..5 {
            for x in 1..5 {
                tpl.put_pixel(x, y, Luma([value]));
            }
        }
        DynamicImage::ImageLuma8(tpl)
    }

    fn ramp_template() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(6, 6, |x, y| Luma([(x * 40 + y) as u8])))
    }

    #[test]
    fn contains_template_finds_planted_sprite() {
        let mut recognizer = Recognizer::new(MatcherMode::Cpu);
        let frame = frame_with_block(12, 8, 240);
        let result = recognizer
            .contains_template(
                &frame,
                &block_template(240),
                None,
                &MatchOptions::with_threshold(0.9),
            )
            .unwrap();
        assert!(result.contains);
        assert_eq!(result.location, (11, 7));
        assert_eq!((result.width, result.height), (6, 6));
    }

    #[test]
    fn frame_crop_shifts_reported_location() {
        let mut recognizer = Recognizer::new(MatcherMode::Cpu);
        let frame = frame_with_block(12, 8, 240);
        let options = MatchOptions {
            threshold: 0.9,
            preprocess: PreprocessConfig {
                crop: Some(CropSpec {
                    format: 2,
                    values: [10, 6, 20, 20],
                }),
                ..PreprocessConfig::default()
            },
            template_crop: None,
        };
        let result = recognizer
            .contains_template(&frame, &block_template(240), None, &options)
            .unwrap();
        // Locations are relative to the cropped frame.
        assert_eq!(result.location, (1, 1));
        assert!(result.contains);
    }

    #[test]
    fn best_of_picks_first_maximum() {
        let mut recognizer = Recognizer::new(MatcherMode::Cpu);
        let frame = frame_with_block(12, 8, 240);
        // Two identical good templates tie; the ramp scores lower.
        let templates = vec![ramp_template(), block_template(240), block_template(240)];
        let result = recognizer.best_of(&frame, &templates, &[], &MatchOptions::with_threshold(0.9));

        assert!(result.is_valid());
        assert_eq!(result.best, Some(1));
        assert_eq!(result.values.len(), 3);
        assert!(result.values[1] > result.values[0]);
        assert_eq!(result.values[1], result.values[2]);
        assert!(result.passed[1]);
        assert!(!result.passed[0]);
        assert_eq!(result.sizes[1], (6, 6));
    }

    #[test]
    fn mask_count_mismatch_is_invalid() {
        let mut recognizer = Recognizer::new(MatcherMode::Cpu);
        let frame = frame_with_block(12, 8, 240);
        let templates = vec![block_template(240), block_template(100)];
        let masks = vec![block_template(255)];
        let result = recognizer.best_of(&frame, &templates, &masks, &MatchOptions::default());

        assert!(!result.is_valid());
        assert_eq!(result, MultiMatchResult::default());
    }

    #[test]
    fn empty_template_list_is_invalid() {
        let mut recognizer = Recognizer::new(MatcherMode::Cpu);
        let frame = frame_with_block(12, 8, 240);
        let result = recognizer.best_of(&frame, &[], &[], &MatchOptions::default());
        assert!(!result.is_valid());
    }

    #[test]
    fn oversized_template_scores_zero_but_keeps_alignment() {
        let mut recognizer = Recognizer::new(MatcherMode::Cpu);
        let frame = frame_with_block(12, 8, 240);
        let huge = DynamicImage::ImageLuma8(GrayImage::new(100, 100));
        let templates = vec![huge, block_template(240)];
        let result = recognizer.best_of(&frame, &templates, &[], &MatchOptions::with_threshold(0.9));

        assert!(result.is_valid());
        assert_eq!(result.best, Some(1));
        assert_eq!(result.values[0], 0.0);
        assert!(!result.passed[0]);
    }
}
