//! Preprocessing pipeline
//!
//! Runs the stages in order on one page:
//!
//! 1. Grayscale conversion
//! 2. Polarity normalization
//! 3. Upscaling
//! 4. Unsharp masking
//! 5. Adaptive Otsu binarization
//! 6. Furigana removal (binary output only)

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GrayImage};
use rayon::ThreadPoolBuilder;
use tracing::{info, instrument};

use super::binarize::adaptive_otsu;
use super::enhance::{scale_gray, unsharp_mask};
use super::grayscale::to_grayscale;
use super::polarity::normalize_polarity;
use super::types::{PreprocessError, PreprocessOptions, Result};
use crate::bitmap::BinaryImage;
use crate::furigana::{FuriganaRemover, FuriganaReport};
use crate::image_io;
use crate::stage::PipelineStage;

/// Final image produced by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutput {
    /// Binarization disabled
    Gray(GrayImage),
    /// Binarized page
    Binary(BinaryImage),
}

impl PipelineOutput {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PipelineOutput::Gray(gray) => gray.dimensions(),
            PipelineOutput::Binary(binary) => binary.dimensions(),
        }
    }

    /// Render as 8-bit grayscale (binary: foreground black)
    pub fn to_gray_image(&self) -> GrayImage {
        match self {
            PipelineOutput::Gray(gray) => gray.clone(),
            PipelineOutput::Binary(binary) => binary.to_gray_image(),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, PipelineOutput::Binary(_))
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub output: PipelineOutput,
    /// The page was inverted during polarity normalization
    pub negated: bool,
    /// Furigana removal report, when removal ran
    pub furigana: Option<FuriganaReport>,
    /// Wall time in seconds
    pub elapsed_seconds: f64,
}

/// Page preprocessor
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    options: PreprocessOptions,
}

impl Preprocessor {
    pub fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Load `input`, run the pipeline and write `output`
    ///
    /// The output format follows the extension of `output`.
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<PipelineResult> {
        info!(stage = %PipelineStage::Loading, path = %input.display());
        let image = image_io::load_image(input)?;
        image_io::output_format(output)?;

        let result = self.process_image(&image)?;

        info!(stage = %PipelineStage::Writing, path = %output.display());
        image_io::save_output(&result.output, output)?;

        Ok(result)
    }

    /// Run the pipeline on a decoded image
    ///
    /// With `threads` set, tile work runs on a dedicated pool of that size;
    /// otherwise on the global rayon pool.
    pub fn process_image(&self, image: &DynamicImage) -> Result<PipelineResult> {
        match self.options.threads {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| PreprocessError::ThreadPool(e.to_string()))?;
                pool.install(|| self.run(image))
            }
            None => self.run(image),
        }
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn run(&self, image: &DynamicImage) -> Result<PipelineResult> {
        let start = Instant::now();
        let opts = &self.options;

        info!(stage = %PipelineStage::Grayscale);
        let mut gray = to_grayscale(image);

        info!(stage = %PipelineStage::Polarity, mode = ?opts.polarity.mode);
        let negated = normalize_polarity(&mut gray, &opts.polarity, &opts.binarize)?;

        if opts.scale.enabled {
            info!(stage = %PipelineStage::Scaling, factor = opts.scale.factor);
            gray = scale_gray(&gray, opts.scale.factor)?;
        }

        if opts.unsharp.enabled {
            info!(
                stage = %PipelineStage::Sharpening,
                halfwidth = opts.unsharp.halfwidth,
                fract = opts.unsharp.fract
            );
            gray = unsharp_mask(&gray, opts.unsharp.halfwidth, opts.unsharp.fract)?;
        }

        if !opts.binarize.enabled {
            return Ok(PipelineResult {
                output: PipelineOutput::Gray(gray),
                negated,
                furigana: None,
                elapsed_seconds: start.elapsed().as_secs_f64(),
            });
        }

        info!(stage = %PipelineStage::Binarizing);
        let mut binary = adaptive_otsu(&gray, &opts.binarize)?;

        let furigana = match opts.furigana.mode.orientation() {
            Some(orientation) => {
                info!(stage = %PipelineStage::RemovingFurigana, ?orientation);
                let remover = FuriganaRemover::new(opts.furigana.to_options(opts.magnification()));
                let report = remover
                    .remove(&mut binary, orientation)
                    .map_err(|source| PreprocessError::FuriganaFailed {
                        orientation,
                        source,
                    })?;
                info!(
                    spans_found = report.spans_found,
                    spans_kept = report.spans_kept,
                    erased_lines = report.erased_lines(),
                    "furigana removed"
                );
                Some(report)
            }
            None => None,
        };

        let elapsed_seconds = start.elapsed().as_secs_f64();
        info!(stage = %PipelineStage::Completed, elapsed_seconds);

        Ok(PipelineResult {
            output: PipelineOutput::Binary(binary),
            negated,
            furigana,
            elapsed_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::types::{FuriganaMode, NegateMode};
    use image::Luma;

    /// White page with black vertical text columns and a thin ruby column
    fn vertical_page() -> GrayImage {
        GrayImage::from_fn(100, 60, |x, _| {
            if (10..30).contains(&x) || (50..70).contains(&x) || (32..39).contains(&x) {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }

    fn unscaled() -> PreprocessOptions {
        PreprocessOptions::builder()
            .scale(None)
            .unsharp(None)
            .otsu_tile(16, 16)
            .build()
    }

    #[test]
    fn test_binarize_only() {
        let image = DynamicImage::ImageLuma8(vertical_page());
        let result = Preprocessor::new(unscaled()).process_image(&image).unwrap();

        assert!(!result.negated);
        assert!(result.furigana.is_none());
        let PipelineOutput::Binary(binary) = &result.output else {
            panic!("expected binary output");
        };
        assert_eq!(binary.dimensions(), (100, 60));
        assert_eq!(binary.get(33, 5), Some(1));
    }

    #[test]
    fn test_furigana_removed() {
        let mut options = unscaled();
        options.furigana.mode = FuriganaMode::Vertical;
        let image = DynamicImage::ImageLuma8(vertical_page());
        let result = Preprocessor::new(options).process_image(&image).unwrap();

        let report = result.furigana.unwrap();
        assert_eq!(report.spans_kept, 2);
        let PipelineOutput::Binary(binary) = &result.output else {
            panic!("expected binary output");
        };
        assert_eq!(binary.get(33, 5), Some(0));
        assert_eq!(binary.get(20, 5), Some(1));
    }

    #[test]
    fn test_binarize_disabled_skips_furigana() {
        let options = PreprocessOptions::builder()
            .scale(None)
            .unsharp(None)
            .binarize(false)
            .furigana(FuriganaMode::Vertical)
            .build();
        let image = DynamicImage::ImageLuma8(vertical_page());
        let result = Preprocessor::new(options).process_image(&image).unwrap();

        assert!(!result.output.is_binary());
        assert!(result.furigana.is_none());
        assert_eq!(result.output.to_gray_image(), vertical_page());
    }

    #[test]
    fn test_scaling_applied() {
        let options = PreprocessOptions::builder()
            .scale(Some(2.0))
            .unsharp(None)
            .otsu_tile(16, 16)
            .build();
        let image = DynamicImage::ImageLuma8(vertical_page());
        let result = Preprocessor::new(options).process_image(&image).unwrap();
        assert_eq!(result.output.dimensions(), (200, 120));
    }

    #[test]
    fn test_forced_negate() {
        let options = PreprocessOptions::builder()
            .negate(NegateMode::Yes)
            .scale(None)
            .unsharp(None)
            .binarize(false)
            .build();
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([200u8])));
        let result = Preprocessor::new(options).process_image(&image).unwrap();

        assert!(result.negated);
        assert_eq!(result.output.to_gray_image().get_pixel(0, 0).0[0], 55);
    }

    #[test]
    fn test_dedicated_thread_pool() {
        let options = PreprocessOptions {
            threads: Some(2),
            ..unscaled()
        };
        let image = DynamicImage::ImageLuma8(vertical_page());
        assert!(Preprocessor::new(options).process_image(&image).is_ok());
    }

    #[test]
    fn test_scale_error_propagates() {
        let options = PreprocessOptions::builder()
            .scale(Some(-1.0))
            .build();
        let image = DynamicImage::ImageLuma8(vertical_page());
        let err = Preprocessor::new(options).process_image(&image).unwrap_err();
        assert_eq!(err.stage(), PipelineStage::Scaling);
        assert_eq!(err.exit_code(), crate::exit_codes::SCALE_FAILED);
    }
}
