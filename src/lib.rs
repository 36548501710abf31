//! ocr-preprocess - OCR preprocessing for scanned Japanese pages
//!
//! Turns a scanned page into a clean binary image for OCR: grayscale
//! conversion, polarity normalization, upscaling, unsharp masking, adaptive
//! Otsu binarization and furigana (ルビ) removal for vertical or horizontal
//! text.
//!
//! # Example
//!
//! ```rust,no_run
//! use ocr_preprocess::{FuriganaMode, PreprocessOptions, Preprocessor};
//!
//! let options = PreprocessOptions::builder()
//!     .furigana(FuriganaMode::Vertical)
//!     .build();
//! let result = Preprocessor::new(options)
//!     .process_file("page.png".as_ref(), "page.ocr.png".as_ref())
//!     .unwrap();
//! println!("{:?}", result.furigana);
//! ```

pub mod bitmap;
pub mod cli;
pub mod config;
pub mod furigana;
pub mod image_io;
pub mod preprocess;
pub mod stage;

pub use bitmap::{BinaryImage, BinaryRaster, RasterError, Rect, BACKGROUND, FOREGROUND};
pub use cli::{Cli, Commands, LegacyArgs, ProcessArgs};
pub use config::{CliOverrides, Config, ConfigError, RuntimeConfig};
pub use furigana::{
    remove_furigana_horizontal, remove_furigana_vertical, Band, FuriganaError, FuriganaOptions,
    FuriganaRemover, FuriganaReport, ScanAxis, Span, SpanList, TextOrientation,
};
pub use image_io::{load_image, output_format, save_gray, save_output, OutputFormat};
pub use preprocess::{
    BinarizeOptions, FuriganaMode, FuriganaSettings, NegateMode, PipelineOutput, PipelineResult,
    PolarityOptions, PreprocessError, PreprocessOptions, PreprocessOptionsBuilder, Preprocessor,
    ScaleOptions, UnsharpOptions,
};
pub use stage::{OutputMode, PipelineStage};

/// Process exit codes
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// Input image missing or unreadable
    pub const READ_FAILED: i32 = 1;
    /// Invalid arguments or configuration
    pub const CONFIG_ERROR: i32 = 2;
    /// Polarity normalization failed
    pub const POLARITY_FAILED: i32 = 4;
    /// Scaling failed
    pub const SCALE_FAILED: i32 = 6;
    /// Unsharp mask failed
    pub const SHARPEN_FAILED: i32 = 7;
    /// Binarization failed
    pub const BINARIZE_FAILED: i32 = 8;
    /// Vertical furigana removal failed
    pub const FURIGANA_VERTICAL_FAILED: i32 = 9;
    /// Horizontal furigana removal failed
    pub const FURIGANA_HORIZONTAL_FAILED: i32 = 10;
    /// Output extension not writable
    pub const UNSUPPORTED_FORMAT: i32 = 11;
    /// Output could not be written
    pub const WRITE_FAILED: i32 = 12;
}
