//! Local OCR: grayscale + contrast normalisation, then an external engine.
//!
//! OCR output is only ever a hint passed to the model alongside the image.
//! The engine sits behind [`OcrEngine`] so the validator can run without it
//! (the default) or with a stub in tests.

use crate::error::OcrError;
use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageFormat};
use std::path::PathBuf;
use tracing::debug;

/// Anything that can turn a poster image into plain text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Convert to 8-bit grayscale and stretch the luma range to 0–255.
///
/// A flat image is returned unchanged.
pub fn preprocess(image: &DynamicImage) -> GrayImage {
    let mut gray = image.to_luma8();
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));

    if max > min {
        let span = (max - min) as u32;
        for p in gray.pixels_mut() {
            p.0[0] = (((p.0[0] - min) as u32 * 255) / span) as u8;
        }
    }
    gray
}

/// OCR via the `tesseract` command-line engine.
///
/// The pre-processed image is written to a temp PNG (tesseract reads files,
/// not stdin buffers, on every platform) and the text is read from stdout.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    languages: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<PathBuf>, languages: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let gray = preprocess(image);
        let tmp = tempfile::Builder::new()
            .prefix("poster-ocr-")
            .suffix(".png")
            .tempfile()?;
        gray.save_with_format(tmp.path(), ImageFormat::Png)?;

        let output = tokio::process::Command::new(&self.binary)
            .arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .output()
            .await
            .map_err(|e| OcrError::Spawn {
                binary: self.binary.display().to_string(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("OCR recognised {} chars", text.chars().count());
        // `tmp` is dropped (and the file deleted) here
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn preprocess_stretches_contrast() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([100, 100, 100]));
        img.put_pixel(1, 0, Rgb([150, 150, 150]));
        let gray = preprocess(&DynamicImage::ImageRgb8(img));
        assert_eq!(gray.get_pixel(0, 0), &Luma([0]));
        assert_eq!(gray.get_pixel(1, 0), &Luma([255]));
    }

    #[test]
    fn preprocess_keeps_flat_image() {
        let img = RgbImage::from_pixel(3, 3, Rgb([42, 42, 42]));
        let gray = preprocess(&DynamicImage::ImageRgb8(img));
        assert!(gray.pixels().all(|p| p.0[0] == 42));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let ocr = TesseractOcr::new("/nonexistent/tesseract-binary", "ara");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])));
        let err = ocr.recognize(&img).await.unwrap_err();
        assert!(matches!(err, OcrError::Spawn { .. }), "got: {err}");
    }
}
