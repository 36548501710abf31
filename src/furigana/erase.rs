//! Span classification and band erasure

use super::types::{Band, FuriganaError, Result, ScanAxis, SpanList};
use crate::bitmap::BinaryRaster;

/// Erasure plan produced from a span list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErasurePlan {
    /// Bands to clear, in increasing offset order
    pub bands: Vec<Band>,
    /// Spans classified as main text
    pub kept: usize,
}

/// Decide which bands to clear
///
/// A span at least `keep_ratio` of `average_width` wide is main text and is
/// preserved; every line between consecutive main-text spans (including any
/// narrower spans there) is cleared, as is the tail after the last one.
/// Lines before the first main-text span are cleared too. When no span
/// qualifies nothing is cleared.
pub fn plan_erasure(
    spans: &SpanList,
    average_width: u32,
    line_count: u32,
    keep_ratio: f64,
) -> ErasurePlan {
    let min_width = (f64::from(average_width) * keep_ratio) as u32;
    let mut plan = ErasurePlan::default();
    let mut cursor = 0u32;

    for span in spans {
        if span.width() < min_width {
            continue;
        }

        if span.start > cursor {
            plan.bands.push(Band {
                offset: cursor,
                extent: span.start - cursor,
            });
        }

        cursor = span.end + 1;
        plan.kept += 1;
    }

    // The final line is never cleared on its own
    if cursor != 0 && cursor.saturating_add(1) < line_count {
        plan.bands.push(Band {
            offset: cursor,
            extent: line_count - cursor,
        });
    }

    plan
}

/// Clear one band across the full perpendicular extent of the raster
pub fn erase_band<R: BinaryRaster + ?Sized>(raster: &mut R, axis: ScanAxis, band: Band) -> Result<()> {
    let rect = axis.band_rect(band, raster.width(), raster.height());

    raster
        .clear_rect(rect)
        .map_err(|source| FuriganaError::EraseRectangle {
            offset: band.offset,
            extent: band.extent,
            source,
        })
}
