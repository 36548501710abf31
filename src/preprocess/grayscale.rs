//! RGB to grayscale conversion

use image::{DynamicImage, GrayImage, Luma};

/// Red weight
pub const RED_WEIGHT: f32 = 0.3;

/// Green weight
pub const GREEN_WEIGHT: f32 = 0.5;

/// Blue weight
pub const BLUE_WEIGHT: f32 = 0.2;

/// Convert any decoded image to 8-bit grayscale
///
/// Color images use the 0.3/0.5/0.2 weighting; alpha is ignored.
/// Grayscale inputs are only narrowed to 8 bits.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
            image.to_luma8()
        }
        _ => {
            let rgb = image.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                let value = RED_WEIGHT * f32::from(r)
                    + GREEN_WEIGHT * f32::from(g)
                    + BLUE_WEIGHT * f32::from(b)
                    + 0.5;
                Luma([value.min(255.0) as u8])
            })
        }
    }
}
