//! Span detection
//!
//! Sweeps the raster line by line along a [`ScanAxis`], classifies each line
//! as good when it holds enough foreground pixels, and groups consecutive
//! good lines into [`Span`]s.

use tracing::{debug, warn};

use super::types::{FuriganaError, Result, ScanAxis, Span, SpanList, SpanThresholds};
use crate::bitmap::{BinaryRaster, FOREGROUND};

/// Spans found by one detection pass
#[derive(Debug, Clone)]
pub struct SpanDetection {
    /// Retained spans in increasing order
    pub spans: SpanList,
    /// Sum of good-line counts over retained spans
    pub total_good_lines: u64,
    /// Scanning stopped early because the list filled up
    pub truncated: bool,
}

impl SpanDetection {
    /// Average retained span width, or `None` when nothing was retained
    pub fn average_width(&self) -> Option<u32> {
        if self.spans.is_empty() {
            return None;
        }
        Some((self.total_good_lines / self.spans.len() as u64) as u32)
    }
}

/// Find spans of foreground content along `axis`
pub fn detect_spans<R: BinaryRaster + ?Sized>(
    raster: &R,
    axis: ScanAxis,
    thresholds: SpanThresholds,
    capacity: usize,
) -> Result<SpanDetection> {
    let (width, height) = (raster.width(), raster.height());
    let line_count = axis.line_count(width, height);
    let line_length = axis.line_length(width, height);

    let mut spans = SpanList::with_capacity(capacity);
    let mut open_start: Option<u32> = None;
    let mut run = 0u32;
    let mut total_good_lines = 0u64;
    let mut truncated = false;

    for line in 0..line_count {
        let mut good = is_good_line(
            raster,
            axis,
            line,
            line_length,
            thresholds.min_fg_pixels_per_line,
        )?;

        // Force the last line bad so an open span is always closed
        if good && line == line_count - 1 {
            good = false;
            run += 1;
        }

        if good {
            open_start.get_or_insert(line);
            run += 1;
            continue;
        }

        if let Some(start) = open_start.take() {
            if run >= thresholds.min_span_width {
                let span = Span { start, end: line };
                spans.push(span);
                total_good_lines += u64::from(run);
                debug!(start, end = line, good_lines = run, "span retained");

                if spans.is_full() {
                    truncated = line + 1 < line_count;
                    if truncated {
                        warn!(
                            capacity,
                            line, "span list full, remaining lines not scanned"
                        );
                    }
                    break;
                }
            }
        }

        run = 0;
    }

    Ok(SpanDetection {
        spans,
        total_good_lines,
        truncated,
    })
}

/// Count foreground pixels on one line, stopping once `min_fg` is reached
fn is_good_line<R: BinaryRaster + ?Sized>(
    raster: &R,
    axis: ScanAxis,
    line: u32,
    line_length: u32,
    min_fg: u32,
) -> Result<bool> {
    let mut count = 0u32;

    for pos in 0..line_length {
        let (x, y) = axis.point(line, pos);
        let value = raster
            .pixel(x, y)
            .map_err(|source| FuriganaError::PixelAccess { x, y, source })?;

        if value == FOREGROUND {
            count += 1;
            if count >= min_fg {
                return Ok(true);
            }
        }
    }

    Ok(false)
}
