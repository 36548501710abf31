//! Adaptive Otsu binarization
//!
//! The page is split into a grid of tiles, each tile gets its own Otsu
//! threshold, and every pixel is compared against the threshold of the tile
//! it falls in. Pixels at or below the threshold become foreground.
//!
//! # Algorithm
//!
//! 1. Grid size `nx = max(1, width / tile_width)`, `ny = max(1, height / tile_height)`;
//!    the last tile in each direction absorbs the remainder
//! 2. Per-tile threshold (computed in parallel with rayon)
//! 3. Optional box smoothing of the threshold map
//! 4. Threshold every pixel against its tile

use image::{imageops, GrayImage};
use imageproc::contrast::otsu_level;
use imageproc::filter::box_filter;
use imageproc::stats::histogram;
use rayon::prelude::*;
use tracing::debug;

use super::types::{BinarizeOptions, PreprocessError, Result, MIN_OTSU_TILE_SIZE};
use crate::bitmap::BinaryImage;

/// Tile layout over an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub nx: u32,
    pub ny: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    width: u32,
    height: u32,
}

impl TileGrid {
    /// Lay out tiles of nominal size `tile_width` x `tile_height`
    pub fn new(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Self {
        let nx = (width / tile_width.max(1)).max(1);
        let ny = (height / tile_height.max(1)).max(1);
        Self {
            nx,
            ny,
            tile_width: width / nx,
            tile_height: height / ny,
            width,
            height,
        }
    }

    /// Pixel bounds (x, y, w, h) of tile (tx, ty)
    pub fn tile_bounds(&self, tx: u32, ty: u32) -> (u32, u32, u32, u32) {
        let x = tx * self.tile_width;
        let y = ty * self.tile_height;
        let w = if tx == self.nx - 1 {
            self.width - x
        } else {
            self.tile_width
        };
        let h = if ty == self.ny - 1 {
            self.height - y
        } else {
            self.tile_height
        };
        (x, y, w, h)
    }

    /// Tile containing pixel (x, y)
    pub fn tile_of(&self, x: u32, y: u32) -> (u32, u32) {
        (
            (x / self.tile_width.max(1)).min(self.nx - 1),
            (y / self.tile_height.max(1)).min(self.ny - 1),
        )
    }
}

/// Binarize a grayscale image with per-tile Otsu thresholds
pub fn adaptive_otsu(gray: &GrayImage, options: &BinarizeOptions) -> Result<BinaryImage> {
    let thresholds = threshold_map(gray, options)?;
    let grid = TileGrid::new(
        gray.width(),
        gray.height(),
        options.tile_width,
        options.tile_height,
    );

    Ok(BinaryImage::from_fn(gray.width(), gray.height(), |x, y| {
        let (tx, ty) = grid.tile_of(x, y);
        gray.get_pixel(x, y).0[0] <= thresholds.get_pixel(tx, ty).0[0]
    }))
}

/// Per-tile thresholds as an `nx` x `ny` image
pub fn threshold_map(gray: &GrayImage, options: &BinarizeOptions) -> Result<GrayImage> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(PreprocessError::BinarizeFailed(
            "image has zero dimensions".to_string(),
        ));
    }
    if options.tile_width < MIN_OTSU_TILE_SIZE || options.tile_height < MIN_OTSU_TILE_SIZE {
        return Err(PreprocessError::BinarizeFailed(format!(
            "tile size {}x{} is below the minimum of {}",
            options.tile_width, options.tile_height, MIN_OTSU_TILE_SIZE
        )));
    }
    if !(0.0..=1.0).contains(&options.score_fraction) {
        return Err(PreprocessError::BinarizeFailed(format!(
            "score fraction {} is outside [0, 1]",
            options.score_fraction
        )));
    }

    let grid = TileGrid::new(width, height, options.tile_width, options.tile_height);

    let levels: Vec<u8> = (0..grid.nx * grid.ny)
        .into_par_iter()
        .map(|i| {
            let (x, y, w, h) = grid.tile_bounds(i % grid.nx, i / grid.nx);
            let tile = imageops::crop_imm(gray, x, y, w, h).to_image();
            tile_threshold(&tile, options.score_fraction)
        })
        .collect();

    let map = GrayImage::from_raw(grid.nx, grid.ny, levels).ok_or_else(|| {
        PreprocessError::BinarizeFailed("threshold map size mismatch".to_string())
    })?;

    let smooth_x = options.smooth_x.min((grid.nx - 1) / 2);
    let smooth_y = options.smooth_y.min((grid.ny - 1) / 2);

    debug!(
        nx = grid.nx,
        ny = grid.ny,
        smooth_x,
        smooth_y,
        "adaptive Otsu thresholds computed"
    );

    if smooth_x == 0 && smooth_y == 0 {
        return Ok(map);
    }

    Ok(box_filter(&map, smooth_x, smooth_y))
}

/// Otsu threshold of one tile
///
/// With a non-zero `score_fraction`, every threshold whose between-class
/// variance is within that fraction of the maximum is a candidate, and the
/// candidate at the histogram minimum wins. This pushes the split into the
/// valley between ink and paper.
pub fn tile_threshold(tile: &GrayImage, score_fraction: f32) -> u8 {
    if score_fraction <= 0.0 {
        return otsu_level(tile);
    }

    let hist = histogram(tile).channels[0];
    let scores = between_class_variance(&hist);
    let max_score = scores.iter().copied().fold(0.0f64, f64::max);
    if max_score <= 0.0 {
        return otsu_level(tile);
    }

    let cutoff = max_score * (1.0 - f64::from(score_fraction));
    (0..=255u8)
        .filter(|&t| scores[t as usize] >= cutoff)
        .min_by_key(|&t| hist[t as usize])
        .unwrap_or_else(|| otsu_level(tile))
}

/// Between-class variance for every split `value <= t`
fn between_class_variance(hist: &[u32; 256]) -> [f64; 256] {
    let total: f64 = hist.iter().map(|&c| f64::from(c)).sum();
    let total_sum: f64 = hist
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * f64::from(c))
        .sum();

    let mut scores = [0.0f64; 256];
    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;

    for (t, &count) in hist.iter().enumerate() {
        weight_bg += f64::from(count);
        sum_bg += t as f64 * f64::from(count);

        let weight_fg = total - weight_bg;
        if weight_bg == 0.0 || weight_fg == 0.0 {
            continue;
        }

        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (total_sum - sum_bg) / weight_fg;
        scores[t] = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::FOREGROUND;
    use image::Luma;

    fn small_tiles() -> BinarizeOptions {
        BinarizeOptions {
            tile_width: 16,
            tile_height: 16,
            ..Default::default()
        }
    }

    #[test]
    fn test_tile_grid_single_tile() {
        let grid = TileGrid::new(100, 50, 2000, 2000);
        assert_eq!((grid.nx, grid.ny), (1, 1));
        assert_eq!(grid.tile_bounds(0, 0), (0, 0, 100, 50));
    }

    #[test]
    fn test_tile_grid_remainder() {
        let grid = TileGrid::new(50, 40, 16, 16);
        assert_eq!((grid.nx, grid.ny), (3, 2));
        assert_eq!(grid.tile_bounds(2, 1), (32, 20, 18, 20));
        assert_eq!(grid.tile_of(49, 39), (2, 1));
    }

    #[test]
    fn test_dark_text_on_white() {
        let gray = GrayImage::from_fn(64, 64, |x, _| {
            if (20..30).contains(&x) {
                Luma([20u8])
            } else {
                Luma([230u8])
            }
        });

        let binary = adaptive_otsu(&gray, &BinarizeOptions::default()).unwrap();
        assert_eq!(binary.get(25, 10), Some(FOREGROUND));
        assert_eq!(binary.get(5, 10), Some(0));
        assert_eq!(binary.count_foreground(), 10 * 64);
    }

    #[test]
    fn test_uniform_white_is_background() {
        let gray = GrayImage::from_pixel(40, 40, Luma([255u8]));
        let binary = adaptive_otsu(&gray, &small_tiles()).unwrap();
        assert_eq!(binary.count_foreground(), 0);
    }

    #[test]
    fn test_per_tile_thresholds_differ() {
        // Left half is dim, right half is bright; each has its own text
        let gray = GrayImage::from_fn(64, 32, |x, y| {
            let base = if x < 32 { 120u8 } else { 240u8 };
            if y % 8 < 2 {
                Luma([base - 100])
            } else {
                Luma([base])
            }
        });

        let map = threshold_map(&gray, &small_tiles()).unwrap();
        assert_eq!(map.dimensions(), (4, 2));
        assert!(map.get_pixel(0, 0).0[0] < map.get_pixel(3, 0).0[0]);
    }

    #[test]
    fn test_tile_too_small() {
        let gray = GrayImage::from_pixel(40, 40, Luma([128u8]));
        let options = BinarizeOptions {
            tile_width: 8,
            ..Default::default()
        };
        assert!(matches!(
            adaptive_otsu(&gray, &options),
            Err(PreprocessError::BinarizeFailed(_))
        ));
    }

    #[test]
    fn test_empty_image() {
        let gray = GrayImage::new(0, 0);
        assert!(adaptive_otsu(&gray, &BinarizeOptions::default()).is_err());
    }

    #[test]
    fn test_score_fraction_picks_valley() {
        // Two clusters with an empty valley between them
        let gray = GrayImage::from_fn(20, 20, |x, _| {
            if x < 5 {
                Luma([30u8])
            } else {
                Luma([200u8])
            }
        });

        let plain = tile_threshold(&gray, 0.0);
        let widened = tile_threshold(&gray, 0.1);
        assert!(plain < 200);
        assert!((30..200).contains(&widened));
    }

    #[test]
    fn test_smoothing_clamped_to_grid() {
        let gray = GrayImage::from_pixel(40, 40, Luma([200u8]));
        let options = BinarizeOptions {
            smooth_x: 10,
            smooth_y: 10,
            ..small_tiles()
        };
        let map = threshold_map(&gray, &options).unwrap();
        assert_eq!(map.dimensions(), (2, 2));
    }
}
