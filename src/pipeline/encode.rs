//! Image encoding: pixel grids → JPEG bytes, image bytes → base64.
//!
//! The web form hands us whatever the browser uploaded. It is decoded into a
//! pixel grid and re-encoded as baseline JPEG so the OCR service always sees
//! one well-supported format. JPEG has no alpha channel, so RGBA input is
//! flattened to RGB first.

use crate::error::AdvisorError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Decode uploaded bytes into a pixel grid.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, AdvisorError> {
    image::load_from_memory(bytes).map_err(|e| AdvisorError::ImageDecodeFailed {
        detail: e.to_string(),
    })
}

/// Encode a pixel grid as JPEG.
pub fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, AdvisorError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| AdvisorError::ImageEncodeFailed {
            detail: e.to_string(),
        })?;
    debug!(
        "Encoded {}x{} image → {} bytes JPEG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Decode any supported upload and normalise it to JPEG.
pub fn normalize_upload(bytes: &[u8]) -> Result<Vec<u8>, AdvisorError> {
    encode_jpeg(&decode_image(bytes)?)
}

/// Base64 (standard alphabet, padded) for the OCR form field.
pub fn to_base64(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64", b64.len());
    b64
}
