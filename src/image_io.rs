//! Image loading and saving
//!
//! Output format is chosen from the file extension. PNM extensions
//! (`pbm`, `pgm`, `ppm`, `pnm`) all write a PNM file whose subtype follows
//! the image content: bitmap for binarized pages, graymap otherwise.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, ImageFormat, ImageReader};
use tracing::debug;

use crate::bitmap::{BinaryImage, BACKGROUND};
use crate::preprocess::{PipelineOutput, PreprocessError, Result};

/// Resolved output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Portable anymap, subtype chosen per image
    Pnm,
    /// Any other format the image crate can encode
    Encoded(ImageFormat),
}

/// Load an image, detecting the format from its content
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    if !path.exists() {
        return Err(PreprocessError::ImageNotFound(path.to_path_buf()));
    }

    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| PreprocessError::ReadFailed(format!("{}: {}", path.display(), e)))?;

    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "image loaded"
    );

    Ok(image)
}

/// Resolve the output format from the extension of `path`
pub fn output_format(path: &Path) -> Result<OutputFormat> {
    let unsupported = || PreprocessError::UnsupportedFormat(path.to_path_buf());

    let format = ImageFormat::from_path(path).map_err(|_| unsupported())?;
    if format == ImageFormat::Pnm {
        return Ok(OutputFormat::Pnm);
    }
    if !format.writing_enabled() {
        return Err(unsupported());
    }

    Ok(OutputFormat::Encoded(format))
}

/// Write a pipeline result to `path`
pub fn save_output(output: &PipelineOutput, path: &Path) -> Result<()> {
    let format = output_format(path)?;

    match (format, output) {
        (OutputFormat::Pnm, PipelineOutput::Binary(binary)) => {
            let (width, height) = binary.dimensions();
            write_pnm(
                &bitmap_samples(binary),
                width,
                height,
                path,
                PnmSubtype::Bitmap(SampleEncoding::Binary),
            )
        }
        (OutputFormat::Pnm, PipelineOutput::Gray(gray)) => write_pnm(
            gray.as_raw(),
            gray.width(),
            gray.height(),
            path,
            PnmSubtype::Graymap(SampleEncoding::Binary),
        ),
        (OutputFormat::Encoded(format), output) => save_gray(&output.to_gray_image(), path, format),
    }
}

/// PBM samples for the encoder: 0 is black (ink), 1 is white (paper)
fn bitmap_samples(binary: &BinaryImage) -> Vec<u8> {
    binary
        .as_raw()
        .iter()
        .map(|&value| u8::from(value == BACKGROUND))
        .collect()
}

/// Write an 8-bit grayscale image in `format`
pub fn save_gray(image: &GrayImage, path: &Path, format: ImageFormat) -> Result<()> {
    image
        .save_with_format(path, format)
        .map_err(|e| PreprocessError::WriteFailed(format!("{}: {}", path.display(), e)))
}

fn write_pnm(
    samples: &[u8],
    width: u32,
    height: u32,
    path: &Path,
    subtype: PnmSubtype,
) -> Result<()> {
    let write_failed = |e: &dyn std::fmt::Display| {
        PreprocessError::WriteFailed(format!("{}: {}", path.display(), e))
    };

    let file = File::create(path).map_err(|e| write_failed(&e))?;
    PnmEncoder::new(BufWriter::new(file))
        .with_subtype(subtype)
        .write_image(samples, width, height, ExtendedColorType::L8)
        .map_err(|e| write_failed(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::FOREGROUND;
    use image::Luma;
    use tempfile::tempdir;

    #[test]
    fn test_output_format() {
        assert_eq!(
            output_format(Path::new("out.png")).unwrap(),
            OutputFormat::Encoded(ImageFormat::Png)
        );
        assert_eq!(output_format(Path::new("out.pbm")).unwrap(), OutputFormat::Pnm);
        assert_eq!(output_format(Path::new("out.ppm")).unwrap(), OutputFormat::Pnm);
    }

    #[test]
    fn test_output_format_unsupported() {
        for name in ["out.xyz", "out"] {
            assert!(matches!(
                output_format(Path::new(name)),
                Err(PreprocessError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn test_load_missing() {
        let result = load_image(Path::new("/nonexistent/page.png"));
        assert!(matches!(result, Err(PreprocessError::ImageNotFound(_))));
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            load_image(&path),
            Err(PreprocessError::ReadFailed(_))
        ));
    }

    #[test]
    fn test_png_roundtrip_gray() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let gray = GrayImage::from_fn(8, 4, |x, _| Luma([(x * 20) as u8]));

        save_output(&PipelineOutput::Gray(gray.clone()), &path).unwrap();
        let loaded = load_image(&path).unwrap().to_luma8();
        assert_eq!(loaded, gray);
    }

    #[test]
    fn test_binary_written_black_on_white() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binary.png");
        let binary = BinaryImage::from_fn(4, 4, |x, _| x == 1);

        save_output(&PipelineOutput::Binary(binary), &path).unwrap();
        let loaded = load_image(&path).unwrap().to_luma8();
        assert_eq!(loaded.get_pixel(1, 0).0[0], 0);
        assert_eq!(loaded.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn test_pbm_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.pbm");
        let binary = BinaryImage::from_fn(8, 2, |x, _| x < 4);

        save_output(&PipelineOutput::Binary(binary), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"P4"));
    }

    #[test]
    fn test_pbm_pixels_black_ink_on_white() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.pbm");
        // Odd width exercises the padded last byte of each row
        let binary = BinaryImage::from_fn(13, 3, |x, y| x < 8 || (x == 12 && y == 1));

        save_output(&PipelineOutput::Binary(binary.clone()), &path).unwrap();
        let loaded = load_image(&path).unwrap().to_luma8();

        assert_eq!(loaded.dimensions(), (13, 3));
        for y in 0..3 {
            for x in 0..13 {
                let expected = if binary.get(x, y) == Some(FOREGROUND) { 0 } else { 255 };
                assert_eq!(loaded.get_pixel(x, y).0[0], expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_bitmap_samples_polarity() {
        let binary = BinaryImage::from_fn(3, 1, |x, _| x == 1);
        assert_eq!(bitmap_samples(&binary), vec![1, 0, 1]);
    }

    #[test]
    fn test_pgm_for_gray_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.ppm");
        let gray = GrayImage::from_pixel(3, 3, Luma([90u8]));

        save_output(&PipelineOutput::Gray(gray), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"P5"));
    }
}
