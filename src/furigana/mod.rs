//! Furigana removal module
//!
//! Erases furigana (ルビ) from a binarized page so that OCR only sees the
//! main text.
//!
//! # Algorithm
//!
//! 1. Sweep the page line by line (columns for vertical text, rows for
//!    horizontal text) and group lines holding enough ink into spans
//! 2. Average the widths of all spans
//! 3. Keep spans at least 90% of the average width as main text
//! 4. Clear everything else between, before and after the kept spans
//!
//! Both orientations run the same code; the [`ScanAxis`] decides which
//! image dimension is swept.
//!
//! # Example
//!
//! ```rust,no_run
//! use ocr_preprocess::{BinaryImage, FuriganaOptions, FuriganaRemover, TextOrientation};
//!
//! let mut page = BinaryImage::new(800, 1200);
//! let remover = FuriganaRemover::new(FuriganaOptions::with_magnification(3.5));
//! let report = remover.remove(&mut page, TextOrientation::Vertical).unwrap();
//! println!("erased {} lines", report.erased_lines());
//! ```

mod detect;
mod erase;
mod types;

pub use detect::{detect_spans, SpanDetection};
pub use erase::{erase_band, plan_erasure, ErasurePlan};
pub use types::{
    Band, FuriganaError, FuriganaOptions, FuriganaOptionsBuilder, FuriganaReport, Result,
    ScanAxis, Span, SpanList, SpanThresholds, TextOrientation, DEFAULT_KEEP_RATIO,
    DEFAULT_MAX_SPANS, DEFAULT_MIN_FG_PIXELS_PER_LINE, DEFAULT_MIN_SPAN_WIDTH,
};

use tracing::debug;

use crate::bitmap::BinaryRaster;

/// Furigana remover
#[derive(Debug, Clone, Default)]
pub struct FuriganaRemover {
    options: FuriganaOptions,
}

impl FuriganaRemover {
    pub fn new(options: FuriganaOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FuriganaOptions {
        &self.options
    }

    /// Detect and erase furigana in place
    ///
    /// On error the raster may already be partially erased.
    pub fn remove<R: BinaryRaster + ?Sized>(
        &self,
        raster: &mut R,
        orientation: TextOrientation,
    ) -> Result<FuriganaReport> {
        let axis = orientation.scan_axis();
        let thresholds = self.options.thresholds()?;

        let detection = detect_spans(&*raster, axis, thresholds, self.options.max_spans)?;

        let Some(average_width) = detection.average_width() else {
            debug!(?orientation, "no spans found, nothing to erase");
            return Ok(FuriganaReport::default());
        };

        let line_count = axis.line_count(raster.width(), raster.height());
        let plan = plan_erasure(
            &detection.spans,
            average_width,
            line_count,
            self.options.keep_ratio,
        );

        debug!(
            ?orientation,
            spans = detection.spans.len(),
            kept = plan.kept,
            average_width,
            bands = plan.bands.len(),
            "furigana erasure planned"
        );

        for &band in &plan.bands {
            erase_band(raster, axis, band)?;
        }

        Ok(FuriganaReport {
            spans_found: detection.spans.len(),
            spans_kept: plan.kept,
            average_width,
            erased_bands: plan.bands,
            truncated: detection.truncated,
        })
    }
}

/// Remove furigana from vertically typeset text (column sweep)
pub fn remove_furigana_vertical<R: BinaryRaster + ?Sized>(
    raster: &mut R,
    magnification: f32,
) -> Result<FuriganaReport> {
    FuriganaRemover::new(FuriganaOptions::with_magnification(magnification))
        .remove(raster, TextOrientation::Vertical)
}

/// Remove furigana from horizontally typeset text (row sweep)
pub fn remove_furigana_horizontal<R: BinaryRaster + ?Sized>(
    raster: &mut R,
    magnification: f32,
) -> Result<FuriganaReport> {
    FuriganaRemover::new(FuriganaOptions::with_magnification(magnification))
        .remove(raster, TextOrientation::Horizontal)
}
