//! Page preprocessing module
//!
//! Prepares a scanned page for OCR.
//!
//! # Stages
//!
//! | Stage | Operation |
//! |-------|-----------|
//! | Grayscale | RGB to 8-bit gray (0.3/0.5/0.2) |
//! | Polarity | Invert light-on-dark pages (border sampling) |
//! | Scaling | Linear interpolation, default 3.5x |
//! | Sharpening | Unsharp mask, half-width 5, fraction 2.5 |
//! | Binarizing | Adaptive Otsu over 2000x2000 tiles |
//! | RemovingFurigana | Vertical or horizontal ruby removal |
//!
//! # Example
//!
//! ```rust,no_run
//! use ocr_preprocess::{FuriganaMode, NegateMode, PreprocessOptions, Preprocessor};
//!
//! let options = PreprocessOptions::builder()
//!     .negate(NegateMode::Auto)
//!     .scale(Some(3.5))
//!     .furigana(FuriganaMode::Horizontal)
//!     .build();
//!
//! let image = image::open("page.png").unwrap();
//! let result = Preprocessor::new(options).process_image(&image).unwrap();
//! ```

mod binarize;
mod enhance;
mod grayscale;
mod pipeline;
mod polarity;
mod types;

pub use binarize::{adaptive_otsu, threshold_map, tile_threshold, TileGrid};
pub use enhance::{scale_gray, unsharp_mask};
pub use grayscale::{to_grayscale, BLUE_WEIGHT, GREEN_WEIGHT, RED_WEIGHT};
pub use pipeline::{PipelineOutput, PipelineResult, Preprocessor};
pub use polarity::{border_darkness, normalize_polarity, should_invert};
pub use types::{
    BinarizeOptions, FuriganaMode, FuriganaSettings, NegateMode, PolarityOptions, PreprocessError,
    PreprocessOptions, PreprocessOptionsBuilder, Result, ScaleOptions, UnsharpOptions,
    DEFAULT_DARK_BG_THRESHOLD, DEFAULT_OTSU_TILE_SIZE, DEFAULT_SCALE_FACTOR,
    DEFAULT_UNSHARP_FRACT, DEFAULT_UNSHARP_HALFWIDTH, MAX_SCALED_DIMENSION, MIN_OTSU_TILE_SIZE,
};
