//! Common types for the furigana module

use crate::bitmap::{RasterError, Rect};
use thiserror::Error;

// ============================================================
// Constants
// ============================================================

/// Minimum foreground pixels for a line to count as part of a span,
/// before scaling by the magnification factor.
/// Furigana is not always separated from the main text by a clean gap.
pub const DEFAULT_MIN_FG_PIXELS_PER_LINE: f32 = 2.0;

/// Minimum run of good lines for a span to be kept, before scaling
pub const DEFAULT_MIN_SPAN_WIDTH: f32 = 5.0;

/// Maximum number of spans collected per call
pub const DEFAULT_MAX_SPANS: usize = 50;

/// Spans at least this fraction of the average width are main text
pub const DEFAULT_KEEP_RATIO: f64 = 0.9;

// ============================================================
// Error Types
// ============================================================

/// Furigana removal error types
#[derive(Debug, Error)]
pub enum FuriganaError {
    #[error("Failed to read pixel ({x}, {y}): {source}")]
    PixelAccess {
        x: u32,
        y: u32,
        #[source]
        source: RasterError,
    },

    #[error("Failed to erase {extent} line(s) at offset {offset}: {source}")]
    EraseRectangle {
        offset: u32,
        extent: u32,
        #[source]
        source: RasterError,
    },

    #[error("Invalid magnification factor: {0}")]
    InvalidMagnification(f32),
}

pub type Result<T> = std::result::Result<T, FuriganaError>;

// ============================================================
// Orientation
// ============================================================

/// Writing direction of the page text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOrientation {
    /// Top-to-bottom columns (縦書き); furigana sits to the right of a column
    Vertical,
    /// Left-to-right rows (横書き); furigana sits above a row
    Horizontal,
}

impl TextOrientation {
    /// Scan axis used for this orientation
    pub fn scan_axis(self) -> ScanAxis {
        match self {
            TextOrientation::Vertical => ScanAxis::Columns,
            TextOrientation::Horizontal => ScanAxis::Rows,
        }
    }
}

/// Direction the span detector sweeps
///
/// `Columns` treats each column as a line and erases full-height slabs,
/// `Rows` treats each row as a line and erases full-width slabs. Everything
/// else in the algorithm is identical under this swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAxis {
    Columns,
    Rows,
}

impl ScanAxis {
    /// Number of lines along the scan axis
    pub fn line_count(self, width: u32, height: u32) -> u32 {
        match self {
            ScanAxis::Columns => width,
            ScanAxis::Rows => height,
        }
    }

    /// Number of pixels on each line
    pub fn line_length(self, width: u32, height: u32) -> u32 {
        match self {
            ScanAxis::Columns => height,
            ScanAxis::Rows => width,
        }
    }

    /// Image coordinate of position `pos` on line `line`
    pub fn point(self, line: u32, pos: u32) -> (u32, u32) {
        match self {
            ScanAxis::Columns => (line, pos),
            ScanAxis::Rows => (pos, line),
        }
    }

    /// Slab covering `extent` lines from `offset`, across the whole image
    pub fn band_rect(self, band: Band, width: u32, height: u32) -> Rect {
        match self {
            ScanAxis::Columns => Rect::new(band.offset, 0, band.extent, height),
            ScanAxis::Rows => Rect::new(0, band.offset, width, band.extent),
        }
    }
}

// ============================================================
// Spans
// ============================================================

/// Run of consecutive good lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// First good line
    pub start: u32,
    /// Line that closed the span
    pub end: u32,
}

impl Span {
    pub fn width(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Ordered span collection with a hard capacity
#[derive(Debug, Clone)]
pub struct SpanList {
    spans: Vec<Span>,
    capacity: usize,
}

impl SpanList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            spans: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a span; returns false and drops it when the list is full
    pub fn push(&mut self, span: Span) -> bool {
        if self.is_full() {
            return false;
        }
        self.spans.push(span);
        true
    }

    pub fn is_full(&self) -> bool {
        self.spans.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }
}

impl<'a> IntoIterator for &'a SpanList {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

/// Region of consecutive lines scheduled for erasure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub offset: u32,
    pub extent: u32,
}

// ============================================================
// Options
// ============================================================

/// Line and span thresholds after magnification scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanThresholds {
    /// Foreground pixels needed for a good line
    pub min_fg_pixels_per_line: u32,
    /// Good lines needed for a span to be kept
    pub min_span_width: u32,
}

/// Furigana removal options
#[derive(Debug, Clone)]
pub struct FuriganaOptions {
    /// Upscaling factor applied before binarization
    pub magnification: f32,
    /// Base foreground pixel count per good line
    pub min_fg_pixels_per_line: f32,
    /// Base minimum span width
    pub min_span_width: f32,
    /// Span list capacity
    pub max_spans: usize,
    /// Fraction of the average span width that counts as main text
    pub keep_ratio: f64,
}

impl Default for FuriganaOptions {
    fn default() -> Self {
        Self {
            magnification: 1.0,
            min_fg_pixels_per_line: DEFAULT_MIN_FG_PIXELS_PER_LINE,
            min_span_width: DEFAULT_MIN_SPAN_WIDTH,
            max_spans: DEFAULT_MAX_SPANS,
            keep_ratio: DEFAULT_KEEP_RATIO,
        }
    }
}

impl FuriganaOptions {
    /// Create a builder
    pub fn builder() -> FuriganaOptionsBuilder {
        FuriganaOptionsBuilder::default()
    }

    /// Default options for an image upscaled by `magnification`
    pub fn with_magnification(magnification: f32) -> Self {
        Self {
            magnification,
            ..Default::default()
        }
    }

    /// Scale the base thresholds and truncate to whole pixels
    pub fn thresholds(&self) -> Result<SpanThresholds> {
        if !self.magnification.is_finite() || self.magnification <= 0.0 {
            return Err(FuriganaError::InvalidMagnification(self.magnification));
        }

        Ok(SpanThresholds {
            min_fg_pixels_per_line: (self.min_fg_pixels_per_line * self.magnification) as u32,
            min_span_width: (self.min_span_width * self.magnification) as u32,
        })
    }
}

/// Builder for FuriganaOptions
#[derive(Debug, Default)]
pub struct FuriganaOptionsBuilder {
    options: FuriganaOptions,
}

impl FuriganaOptionsBuilder {
    /// Set magnification factor
    #[must_use]
    pub fn magnification(mut self, factor: f32) -> Self {
        self.options.magnification = factor;
        self
    }

    /// Set base foreground pixels per line
    #[must_use]
    pub fn min_fg_pixels_per_line(mut self, pixels: f32) -> Self {
        self.options.min_fg_pixels_per_line = pixels.max(0.0);
        self
    }

    /// Set base minimum span width
    #[must_use]
    pub fn min_span_width(mut self, width: f32) -> Self {
        self.options.min_span_width = width.max(0.0);
        self
    }

    /// Set span list capacity
    #[must_use]
    pub fn max_spans(mut self, max: usize) -> Self {
        self.options.max_spans = max.max(1);
        self
    }

    /// Set main text ratio
    #[must_use]
    pub fn keep_ratio(mut self, ratio: f64) -> Self {
        self.options.keep_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> FuriganaOptions {
        self.options
    }
}

// ============================================================
// Report
// ============================================================

/// Outcome of one furigana removal call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuriganaReport {
    /// Spans retained by the detector
    pub spans_found: usize,
    /// Spans classified as main text
    pub spans_kept: usize,
    /// Average retained span width (0 when no spans)
    pub average_width: u32,
    /// Bands cleared to background
    pub erased_bands: Vec<Band>,
    /// Detection stopped because the span list was full
    pub truncated: bool,
}

impl FuriganaReport {
    /// Total lines cleared
    pub fn erased_lines(&self) -> u64 {
        self.erased_bands.iter().map(|b| b.extent as u64).sum()
    }
}
