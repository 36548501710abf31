//! Common types for the preprocessing pipeline

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exit_codes;
use crate::furigana::{
    FuriganaError, FuriganaOptions, TextOrientation, DEFAULT_KEEP_RATIO, DEFAULT_MAX_SPANS,
    DEFAULT_MIN_FG_PIXELS_PER_LINE, DEFAULT_MIN_SPAN_WIDTH,
};
use crate::stage::PipelineStage;

// ============================================================
// Constants
// ============================================================

/// Border darkness above which the page is treated as light-on-dark
pub const DEFAULT_DARK_BG_THRESHOLD: f32 = 0.5;

/// Default upscaling factor
pub const DEFAULT_SCALE_FACTOR: f32 = 3.5;

/// Default unsharp mask half-width
pub const DEFAULT_UNSHARP_HALFWIDTH: u32 = 5;

/// Default unsharp mask fraction
pub const DEFAULT_UNSHARP_FRACT: f32 = 2.5;

/// Default Otsu tile size (pixels)
pub const DEFAULT_OTSU_TILE_SIZE: u32 = 2000;

/// Smallest accepted Otsu tile size
pub const MIN_OTSU_TILE_SIZE: u32 = 16;

/// Largest dimension the scaler will produce
pub const MAX_SCALED_DIMENSION: u32 = 100_000;

// ============================================================
// Error Types
// ============================================================

/// Preprocessing error types
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("Failed to read image: {0}")]
    ReadFailed(String),

    #[error("Polarity detection failed: {0}")]
    PolarityFailed(String),

    #[error("Scaling failed: {0}")]
    ScaleFailed(String),

    #[error("Unsharp mask failed: {0}")]
    SharpenFailed(String),

    #[error("Binarization failed: {0}")]
    BinarizeFailed(String),

    #[error("Furigana removal failed ({orientation:?}): {source}")]
    FuriganaFailed {
        orientation: TextOrientation,
        #[source]
        source: FuriganaError,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to write image: {0}")]
    WriteFailed(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PreprocessError>;

impl PreprocessError {
    /// Pipeline stage the error belongs to
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::ImageNotFound(_) | Self::ReadFailed(_) => PipelineStage::Loading,
            Self::PolarityFailed(_) => PipelineStage::Polarity,
            Self::ScaleFailed(_) => PipelineStage::Scaling,
            Self::SharpenFailed(_) => PipelineStage::Sharpening,
            Self::BinarizeFailed(_) => PipelineStage::Binarizing,
            Self::FuriganaFailed { .. } => PipelineStage::RemovingFurigana,
            Self::UnsupportedFormat(_) | Self::WriteFailed(_) | Self::IoError(_) => {
                PipelineStage::Writing
            }
            Self::ThreadPool(_) => PipelineStage::Initializing,
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ImageNotFound(_) | Self::ReadFailed(_) => exit_codes::READ_FAILED,
            Self::PolarityFailed(_) => exit_codes::POLARITY_FAILED,
            Self::ScaleFailed(_) => exit_codes::SCALE_FAILED,
            Self::SharpenFailed(_) => exit_codes::SHARPEN_FAILED,
            Self::BinarizeFailed(_) => exit_codes::BINARIZE_FAILED,
            Self::FuriganaFailed {
                orientation: TextOrientation::Vertical,
                ..
            } => exit_codes::FURIGANA_VERTICAL_FAILED,
            Self::FuriganaFailed {
                orientation: TextOrientation::Horizontal,
                ..
            } => exit_codes::FURIGANA_HORIZONTAL_FAILED,
            Self::UnsupportedFormat(_) => exit_codes::UNSUPPORTED_FORMAT,
            Self::WriteFailed(_) | Self::IoError(_) => exit_codes::WRITE_FAILED,
            Self::ThreadPool(_) => exit_codes::CONFIG_ERROR,
        }
    }
}

// ============================================================
// Modes
// ============================================================

/// Polarity normalization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NegateMode {
    /// Never invert
    No,
    /// Always invert
    Yes,
    /// Invert when the page border is dark
    #[default]
    Auto,
}

impl TryFrom<u8> for NegateMode {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(NegateMode::No),
            1 => Ok(NegateMode::Yes),
            2 => Ok(NegateMode::Auto),
            other => Err(format!("negate mode must be 0, 1 or 2 (got {other})")),
        }
    }
}

/// Furigana removal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FuriganaMode {
    /// Keep furigana
    #[default]
    #[serde(alias = "none")]
    #[value(alias = "none")]
    Disabled,
    /// Vertical text (縦書き)
    Vertical,
    /// Horizontal text (横書き)
    Horizontal,
}

impl FuriganaMode {
    /// Orientation to run the remover with, if any
    pub fn orientation(self) -> Option<TextOrientation> {
        match self {
            FuriganaMode::Disabled => None,
            FuriganaMode::Vertical => Some(TextOrientation::Vertical),
            FuriganaMode::Horizontal => Some(TextOrientation::Horizontal),
        }
    }
}

impl TryFrom<u8> for FuriganaMode {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(FuriganaMode::Disabled),
            1 => Ok(FuriganaMode::Vertical),
            2 => Ok(FuriganaMode::Horizontal),
            other => Err(format!("furigana mode must be 0, 1 or 2 (got {other})")),
        }
    }
}

// ============================================================
// Options
// ============================================================

/// Polarity normalization options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolarityOptions {
    /// Negate mode
    pub mode: NegateMode,
    /// Border darkness threshold (0.0 = all white, 1.0 = all black)
    pub dark_bg_threshold: f32,
}

impl Default for PolarityOptions {
    fn default() -> Self {
        Self {
            mode: NegateMode::Auto,
            dark_bg_threshold: DEFAULT_DARK_BG_THRESHOLD,
        }
    }
}

/// Upscaling options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleOptions {
    pub enabled: bool,
    /// Scale factor applied to both axes
    pub factor: f32,
}

impl Default for ScaleOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            factor: DEFAULT_SCALE_FACTOR,
        }
    }
}

/// Unsharp mask options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsharpOptions {
    pub enabled: bool,
    /// Half-width of the smoothing kernel
    pub halfwidth: u32,
    /// Fraction of the high-pass signal added back
    pub fract: f32,
}

impl Default for UnsharpOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            halfwidth: DEFAULT_UNSHARP_HALFWIDTH,
            fract: DEFAULT_UNSHARP_FRACT,
        }
    }
}

/// Adaptive Otsu binarization options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizeOptions {
    pub enabled: bool,
    /// Nominal tile width
    pub tile_width: u32,
    /// Nominal tile height
    pub tile_height: u32,
    /// Horizontal half-width for threshold map smoothing
    pub smooth_x: u32,
    /// Vertical half-width for threshold map smoothing
    pub smooth_y: u32,
    /// Fraction of the max Otsu score searched for a histogram minimum
    pub score_fraction: f32,
}

impl Default for BinarizeOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            tile_width: DEFAULT_OTSU_TILE_SIZE,
            tile_height: DEFAULT_OTSU_TILE_SIZE,
            smooth_x: 0,
            smooth_y: 0,
            score_fraction: 0.0,
        }
    }
}

/// Furigana removal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuriganaSettings {
    pub mode: FuriganaMode,
    /// Foreground pixels per good line before magnification
    pub min_fg_pixels_per_line: f32,
    /// Minimum span width before magnification
    pub min_span_width: f32,
    /// Span list capacity
    pub max_spans: usize,
    /// Fraction of the average span width kept as main text
    pub keep_ratio: f64,
    /// Threshold magnification; unset follows the scale factor while
    /// scaling is enabled
    pub magnification: Option<f32>,
}

impl Default for FuriganaSettings {
    fn default() -> Self {
        Self {
            mode: FuriganaMode::Disabled,
            min_fg_pixels_per_line: DEFAULT_MIN_FG_PIXELS_PER_LINE,
            min_span_width: DEFAULT_MIN_SPAN_WIDTH,
            max_spans: DEFAULT_MAX_SPANS,
            keep_ratio: DEFAULT_KEEP_RATIO,
            magnification: None,
        }
    }
}

impl FuriganaSettings {
    /// Remover options for an image upscaled by `magnification`
    pub fn to_options(&self, magnification: f32) -> FuriganaOptions {
        FuriganaOptions::builder()
            .magnification(magnification)
            .min_fg_pixels_per_line(self.min_fg_pixels_per_line)
            .min_span_width(self.min_span_width)
            .max_spans(self.max_spans)
            .keep_ratio(self.keep_ratio)
            .build()
    }
}

/// Full preprocessing options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    pub polarity: PolarityOptions,
    pub scale: ScaleOptions,
    pub unsharp: UnsharpOptions,
    pub binarize: BinarizeOptions,
    pub furigana: FuriganaSettings,
    /// Worker threads for tile processing (None = all CPUs)
    pub threads: Option<usize>,
}

impl PreprocessOptions {
    /// Create a builder
    pub fn builder() -> PreprocessOptionsBuilder {
        PreprocessOptionsBuilder::default()
    }

    /// Magnification used to scale furigana thresholds
    ///
    /// An explicit `furigana.magnification` wins. Otherwise it is the scale
    /// factor when scaling is enabled and 1.0 when it is not.
    pub fn magnification(&self) -> f32 {
        if let Some(magnification) = self.furigana.magnification {
            return magnification;
        }
        if self.scale.enabled {
            self.scale.factor
        } else {
            1.0
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Builder for PreprocessOptions
#[derive(Debug, Default)]
pub struct PreprocessOptionsBuilder {
    options: PreprocessOptions,
}

impl PreprocessOptionsBuilder {
    /// Set negate mode
    #[must_use]
    pub fn negate(mut self, mode: NegateMode) -> Self {
        self.options.polarity.mode = mode;
        self
    }

    /// Set dark background threshold
    #[must_use]
    pub fn dark_bg_threshold(mut self, threshold: f32) -> Self {
        self.options.polarity.dark_bg_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set scale factor, `None` disables scaling
    #[must_use]
    pub fn scale(mut self, factor: Option<f32>) -> Self {
        match factor {
            Some(f) => {
                self.options.scale.enabled = true;
                self.options.scale.factor = f;
            }
            None => self.options.scale.enabled = false,
        }
        self
    }

    /// Set unsharp mask parameters, `None` disables sharpening
    #[must_use]
    pub fn unsharp(mut self, params: Option<(u32, f32)>) -> Self {
        match params {
            Some((halfwidth, fract)) => {
                self.options.unsharp.enabled = true;
                self.options.unsharp.halfwidth = halfwidth;
                self.options.unsharp.fract = fract;
            }
            None => self.options.unsharp.enabled = false,
        }
        self
    }

    /// Enable or disable binarization
    #[must_use]
    pub fn binarize(mut self, enabled: bool) -> Self {
        self.options.binarize.enabled = enabled;
        self
    }

    /// Set Otsu tile size
    #[must_use]
    pub fn otsu_tile(mut self, width: u32, height: u32) -> Self {
        self.options.binarize.tile_width = width;
        self.options.binarize.tile_height = height;
        self
    }

    /// Set threshold map smoothing
    #[must_use]
    pub fn otsu_smoothing(mut self, x: u32, y: u32) -> Self {
        self.options.binarize.smooth_x = x;
        self.options.binarize.smooth_y = y;
        self
    }

    /// Set Otsu score fraction
    #[must_use]
    pub fn otsu_score_fraction(mut self, fraction: f32) -> Self {
        self.options.binarize.score_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Set furigana mode
    #[must_use]
    pub fn furigana(mut self, mode: FuriganaMode) -> Self {
        self.options.furigana.mode = mode;
        self
    }

    /// Set worker thread count
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.options.threads = Some(threads.max(1));
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> PreprocessOptions {
        self.options
    }
}
