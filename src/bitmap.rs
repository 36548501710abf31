//! Binary pixel buffer
//!
//! A one-bit-per-pixel raster stored as one byte per pixel, holding exactly
//! [`BACKGROUND`] or [`FOREGROUND`]. The furigana remover works against the
//! [`BinaryRaster`] trait so any owner of a binary grid can be processed in
//! place.

use image::{GrayImage, Luma};
use thiserror::Error;

/// Background (paper) pixel value
pub const BACKGROUND: u8 = 0;

/// Foreground (ink) pixel value
pub const FOREGROUND: u8 = 1;

/// Raster access error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("Pixel ({x}, {y}) is outside the {width}x{height} raster")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("Invalid rectangle {rect:?} for {width}x{height} raster")]
    InvalidRect { rect: Rect, width: u32, height: u32 },

    #[error("Buffer length {actual} does not match {width}x{height}")]
    BufferSize {
        width: u32,
        height: u32,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, RasterError>;

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the rectangle is non-empty and lies inside `width` x `height`
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty()
            && self
                .x
                .checked_add(self.width)
                .is_some_and(|right| right <= width)
            && self
                .y
                .checked_add(self.height)
                .is_some_and(|bottom| bottom <= height)
    }
}

/// Mutable binary raster consumed by the furigana remover
pub trait BinaryRaster {
    /// Raster width in pixels
    fn width(&self) -> u32;

    /// Raster height in pixels
    fn height(&self) -> u32;

    /// Read one pixel ([`BACKGROUND`] or [`FOREGROUND`])
    fn pixel(&self, x: u32, y: u32) -> Result<u8>;

    /// Set every pixel inside `rect` to [`BACKGROUND`]
    ///
    /// Implementations must reject empty or out-of-range rectangles without
    /// touching any pixel.
    fn clear_rect(&mut self, rect: Rect) -> Result<()>;
}

/// Owned binary image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BinaryImage {
    /// Create an all-background image
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![BACKGROUND; width as usize * height as usize],
        }
    }

    /// Build an image from a predicate evaluated at every pixel
    pub fn from_fn(width: u32, height: u32, mut is_foreground: impl FnMut(u32, u32) -> bool) -> Self {
        let mut image = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if is_foreground(x, y) {
                    image.data[y as usize * width as usize + x as usize] = FOREGROUND;
                }
            }
        }
        image
    }

    /// Wrap a row-major buffer; any non-zero byte is treated as foreground
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if data.len() != width as usize * height as usize {
            return Err(RasterError::BufferSize {
                width,
                height,
                actual: data.len(),
            });
        }

        let data = data
            .into_iter()
            .map(|v| if v == BACKGROUND { BACKGROUND } else { FOREGROUND })
            .collect();

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Image dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw row-major pixel values
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Pixel value, or `None` outside the image
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        self.index(x, y).map(|i| self.data[i])
    }

    /// Set a pixel to foreground or background
    pub fn set(&mut self, x: u32, y: u32, foreground: bool) -> Result<()> {
        let i = self.index(x, y).ok_or(RasterError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.data[i] = if foreground { FOREGROUND } else { BACKGROUND };
        Ok(())
    }

    /// Number of foreground pixels
    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|&&v| v == FOREGROUND).count()
    }

    /// Swap the x and y axes
    pub fn transpose(&self) -> Self {
        let mut out = Self::new(self.height, self.width);
        for y in 0..self.height {
            for x in 0..self.width {
                let src = self.data[y as usize * self.width as usize + x as usize];
                out.data[x as usize * self.height as usize + y as usize] = src;
            }
        }
        out
    }

    /// Fraction of foreground pixels on the line from (x1, y1) to (x2, y2)
    ///
    /// The line must be horizontal or vertical; endpoints are clamped to the
    /// image.
    pub fn foreground_fraction_on_line(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> Option<f32> {
        if self.width == 0 || self.height == 0 || (x1 != x2 && y1 != y2) {
            return None;
        }

        let clamp_x = |x: u32| x.min(self.width - 1);
        let clamp_y = |y: u32| y.min(self.height - 1);

        let (count, hits) = if y1 == y2 {
            let y = clamp_y(y1);
            let (lo, hi) = (clamp_x(x1.min(x2)), clamp_x(x1.max(x2)));
            let hits = (lo..=hi)
                .filter(|&x| self.data[self.offset(x, y)] == FOREGROUND)
                .count();
            (hi - lo + 1, hits)
        } else {
            let x = clamp_x(x1);
            let (lo, hi) = (clamp_y(y1.min(y2)), clamp_y(y1.max(y2)));
            let hits = (lo..=hi)
                .filter(|&y| self.data[self.offset(x, y)] == FOREGROUND)
                .count();
            (hi - lo + 1, hits)
        };

        Some(hits as f32 / count as f32)
    }

    /// Render as 8-bit grayscale: foreground black, background white
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.data[self.offset(x, y)] == FOREGROUND {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| self.offset(x, y))
    }
}

impl BinaryRaster for BinaryImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Result<u8> {
        self.get(x, y).ok_or(RasterError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })
    }

    fn clear_rect(&mut self, rect: Rect) -> Result<()> {
        if !rect.fits_within(self.width, self.height) {
            return Err(RasterError::InvalidRect {
                rect,
                width: self.width,
                height: self.height,
            });
        }

        let stride = self.width as usize;
        for y in rect.y..rect.y + rect.height {
            let row = y as usize * stride;
            let start = row + rect.x as usize;
            self.data[start..start + rect.width as usize].fill(BACKGROUND);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_background() {
        let image = BinaryImage::new(4, 3);
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.count_foreground(), 0);
    }

    #[test]
    fn test_from_raw_normalizes_values() {
        let image = BinaryImage::from_raw(2, 2, vec![0, 255, 1, 7]).unwrap();
        assert_eq!(image.as_raw(), &[0, 1, 1, 1]);
    }

    #[test]
    fn test_from_raw_size_mismatch() {
        let result = BinaryImage::from_raw(3, 3, vec![0; 4]);
        assert!(matches!(result, Err(RasterError::BufferSize { actual: 4, .. })));
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let image = BinaryImage::new(2, 2);
        assert!(matches!(
            image.pixel(2, 0),
            Err(RasterError::OutOfBounds { x: 2, y: 0, .. })
        ));
    }

    #[test]
    fn test_clear_rect() {
        let mut image = BinaryImage::from_fn(5, 4, |_, _| true);
        image.clear_rect(Rect::new(1, 0, 2, 4)).unwrap();

        for y in 0..4 {
            assert_eq!(image.get(0, y), Some(FOREGROUND));
            assert_eq!(image.get(1, y), Some(BACKGROUND));
            assert_eq!(image.get(2, y), Some(BACKGROUND));
            assert_eq!(image.get(3, y), Some(FOREGROUND));
        }
    }

    #[test]
    fn test_clear_rect_rejects_without_partial_write() {
        let mut image = BinaryImage::from_fn(5, 4, |_, _| true);
        let before = image.clone();

        assert!(image.clear_rect(Rect::new(3, 0, 3, 4)).is_err());
        assert!(image.clear_rect(Rect::new(0, 0, 0, 4)).is_err());
        assert!(image.clear_rect(Rect::new(u32::MAX, 0, 2, 1)).is_err());
        assert_eq!(image, before);
    }

    #[test]
    fn test_transpose() {
        let image = BinaryImage::from_fn(3, 2, |x, y| x == 2 && y == 0);
        let t = image.transpose();
        assert_eq!(t.dimensions(), (2, 3));
        assert_eq!(t.get(0, 2), Some(FOREGROUND));
        assert_eq!(t.transpose(), image);
    }

    #[test]
    fn test_foreground_fraction_on_line() {
        let image = BinaryImage::from_fn(4, 4, |x, _| x < 2);
        assert_eq!(image.foreground_fraction_on_line(0, 0, 3, 0), Some(0.5));
        assert_eq!(image.foreground_fraction_on_line(0, 0, 0, 3), Some(1.0));
        assert_eq!(image.foreground_fraction_on_line(3, 0, 3, 3), Some(0.0));
        assert_eq!(image.foreground_fraction_on_line(0, 0, 3, 3), None);
    }

    #[test]
    fn test_to_gray_image() {
        let image = BinaryImage::from_fn(2, 1, |x, _| x == 0);
        let gray = image.to_gray_image();
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(gray.get_pixel(1, 0).0[0], 255);
    }
}
