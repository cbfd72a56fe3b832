//! Template and options loading.
//!
//! Thin file layer for the assets recognition consumes: template/mask
//! images and JSON sidecar files carrying [`MatchOptions`]. Capture-frame
//! persistence and path resolution policy stay with the application.

use std::fs;
use std::io;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use log::debug;
use thiserror::Error;

use crate::recognition::MatchOptions;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write image {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid match options in {path}: {source}")]
    BadOptions {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// How to interpret an image file on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    Color,
    Grayscale,
}

/// Loads a template or mask image.
pub fn read_image<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<DynamicImage, LoadError> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|source| LoadError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    debug!("loaded {} ({}x{})", path.display(), img.width(), img.height());
    Ok(match mode {
        ReadMode::Color => img,
        ReadMode::Grayscale => DynamicImage::ImageLuma8(img.to_luma8()),
    })
}

/// Writes an image, format chosen by the file extension.
pub fn write_image<P: AsRef<Path>>(path: P, img: &DynamicImage) -> Result<(), LoadError> {
    let path = path.as_ref();
    img.save(path).map_err(|source| LoadError::Encode {
        path: path.display().to_string(),
        source,
    })
}

/// Reads a JSON [`MatchOptions`] sidecar file.
pub fn load_match_options<P: AsRef<Path>>(path: P) -> Result<MatchOptions, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::BadOptions {
        path: path.display().to_string(),
        source,
    })
}

/// True when the extension is an image format recognizers can consume.
pub fn is_supported_image<P: AsRef<Path>>(path: P) -> bool {
    ImageFormat::from_path(path).is_ok()
}
