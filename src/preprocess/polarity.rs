//! Polarity normalization
//!
//! OCR expects dark text on a light page. Scans of inverted material
//! (white text on black) are detected by looking at the page border: after
//! a trial binarization, a border that is mostly foreground means the
//! background is dark.

use image::{imageops, GrayImage};
use tracing::debug;

use super::binarize::adaptive_otsu;
use super::types::{BinarizeOptions, NegateMode, PolarityOptions, PreprocessError, Result};
use crate::bitmap::BinaryImage;

/// Average foreground fraction over the four border lines
///
/// 0.0 means a white border, 1.0 a black one.
pub fn border_darkness(binary: &BinaryImage) -> Option<f32> {
    let (width, height) = binary.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let (right, bottom) = (width - 1, height - 1);

    let top = binary.foreground_fraction_on_line(0, 0, right, 0)?;
    let bottom_line = binary.foreground_fraction_on_line(0, bottom, right, bottom)?;
    let left = binary.foreground_fraction_on_line(0, 0, 0, bottom)?;
    let right_line = binary.foreground_fraction_on_line(right, 0, right, bottom)?;

    Some((top + bottom_line + left + right_line) / 4.0)
}

/// Decide whether `gray` should be inverted
pub fn should_invert(
    gray: &GrayImage,
    polarity: &PolarityOptions,
    binarize: &BinarizeOptions,
) -> Result<bool> {
    match polarity.mode {
        NegateMode::No => Ok(false),
        NegateMode::Yes => Ok(true),
        NegateMode::Auto => {
            let binary = adaptive_otsu(gray, binarize)
                .map_err(|e| PreprocessError::PolarityFailed(e.to_string()))?;
            let darkness = border_darkness(&binary).ok_or_else(|| {
                PreprocessError::PolarityFailed("cannot sample border of empty image".to_string())
            })?;

            debug!(
                darkness,
                threshold = polarity.dark_bg_threshold,
                "border darkness measured"
            );

            Ok(darkness > polarity.dark_bg_threshold)
        }
    }
}

/// Invert `gray` in place when needed, returning whether it was inverted
pub fn normalize_polarity(
    gray: &mut GrayImage,
    polarity: &PolarityOptions,
    binarize: &BinarizeOptions,
) -> Result<bool> {
    let invert = should_invert(gray, polarity, binarize)?;
    if invert {
        imageops::invert(gray);
    }
    Ok(invert)
}
