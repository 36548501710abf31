//! Upscaling and unsharp masking
//!
//! # Algorithm
//!
//! - Scaling: linear interpolation, output size `trunc(dim * factor + 0.5)`
//! - Unsharp mask: block-mean blur with half-width `h`, then
//!   `out = src + fract * (src - blur)`, clamped to 0..=255

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::filter::box_filter;

use super::types::{PreprocessError, Result, MAX_SCALED_DIMENSION};

/// Scale a grayscale image by `factor` on both axes
pub fn scale_gray(gray: &GrayImage, factor: f32) -> Result<GrayImage> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(PreprocessError::ScaleFailed(format!(
            "scale factor must be positive (got {factor})"
        )));
    }
    if gray.width() == 0 || gray.height() == 0 {
        return Err(PreprocessError::ScaleFailed(
            "image has zero dimensions".to_string(),
        ));
    }

    let width = scaled_dimension(gray.width(), factor)?;
    let height = scaled_dimension(gray.height(), factor)?;

    if (width, height) == gray.dimensions() {
        return Ok(gray.clone());
    }

    Ok(imageops::resize(gray, width, height, FilterType::Triangle))
}

fn scaled_dimension(dim: u32, factor: f32) -> Result<u32> {
    let scaled = (f64::from(dim) * f64::from(factor) + 0.5).floor();
    if scaled > f64::from(MAX_SCALED_DIMENSION) {
        return Err(PreprocessError::ScaleFailed(format!(
            "scaled dimension {scaled} exceeds {MAX_SCALED_DIMENSION}"
        )));
    }
    Ok((scaled as u32).max(1))
}

/// Sharpen a grayscale image
///
/// `halfwidth == 0` or `fract <= 0` returns the input unchanged.
pub fn unsharp_mask(gray: &GrayImage, halfwidth: u32, fract: f32) -> Result<GrayImage> {
    if !fract.is_finite() {
        return Err(PreprocessError::SharpenFailed(format!(
            "fraction must be finite (got {fract})"
        )));
    }
    if halfwidth == 0 || fract <= 0.0 {
        return Ok(gray.clone());
    }

    let blurred = box_filter(gray, halfwidth, halfwidth);

    Ok(GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let src = f32::from(gray.get_pixel(x, y).0[0]);
        let blur = f32::from(blurred.get_pixel(x, y).0[0]);
        let value = (src + fract * (src - blur) + 0.5) as i32;
        Luma([value.clamp(0, 255) as u8])
    }))
}
