//! Autopad Computer Vision Library
//!
//! Frame preprocessing and template-matching recognition for the capture
//! side of the automation loop: crop normalization, grayscale/HSV/threshold
//! binarization, interframe motion masks, and CPU/GPU template matchers
//! with multi-template selection.

pub mod crop;
pub mod loader;
pub mod matcher;
pub mod preprocess;
pub mod recognition;

// Re-export commonly used types
pub use crop::{CropRect, CropSpec, encode_crop, parse_crop};
pub use loader::{LoadError, ReadMode, load_match_options, read_image, write_image};
pub use matcher::{MatchResult, Matcher, MatcherMode, TemplateMatch};
pub use preprocess::{ColorStage, Hsv, HsvRange, PreprocessConfig, interframe_diff, preprocess};
pub use recognition::{MatchOptions, MultiMatchResult, Recognizer};

// Error handling
pub type Result<T> = anyhow::Result<T>;
