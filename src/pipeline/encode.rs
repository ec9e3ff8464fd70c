//! Upload encoding: raw bytes → decoded image + base64 payload for the VLM.
//!
//! VLM APIs accept images as base64 data embedded in the JSON request body.
//! Uploads in a format the model understands (PNG, JPEG, WebP) are forwarded
//! byte-for-byte when they are small enough; oversized uploads are
//! downscaled and re-encoded as PNG, which is lossless and keeps Arabic
//! script crisp.

use crate::error::ModelCallError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// A base64-encoded image ready for the multimodal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: &'static str,
}

/// An upload that decoded successfully.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Decoded pixels, reused by local OCR.
    pub image: DynamicImage,
    /// What the model receives.
    pub encoded: EncodedImage,
}

/// Decode an upload and produce the payload sent to the model.
///
/// Fails with [`ModelCallError::InvalidImage`] when the bytes are not a PNG,
/// JPEG or WebP image.
pub fn prepare_upload(bytes: &[u8], max_dimension: u32) -> Result<PreparedImage, ModelCallError> {
    let format = image::guess_format(bytes).map_err(|e| ModelCallError::InvalidImage {
        detail: e.to_string(),
    })?;
    let mime_type = mime_for(format).ok_or_else(|| ModelCallError::InvalidImage {
        detail: format!("{format:?} uploads are not supported; use PNG, JPEG or WebP"),
    })?;

    let image = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        ModelCallError::InvalidImage {
            detail: e.to_string(),
        }
    })?;

    let (w, h) = image.dimensions();
    let encoded = if w.max(h) > max_dimension {
        let resized = image.resize(max_dimension, max_dimension, image::imageops::FilterType::Triangle);
        debug!(
            "Downscaled upload {}x{} → {}x{}",
            w,
            h,
            resized.width(),
            resized.height()
        );
        encode_png(&resized).map_err(|e| ModelCallError::InvalidImage {
            detail: format!("re-encoding failed: {e}"),
        })?
    } else {
        EncodedImage {
            data: STANDARD.encode(bytes),
            mime_type,
        }
    };

    debug!("Encoded image → {} bytes base64 ({})", encoded.data.len(), encoded.mime_type);
    Ok(PreparedImage { image, encoded })
}

/// Encode an image as a base64 PNG.
pub fn encode_png(img: &DynamicImage) -> Result<EncodedImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(EncodedImage {
        data: STANDARD.encode(&buf),
        mime_type: "image/png",
    })
}

fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}
