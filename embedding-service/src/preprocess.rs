//! Image preprocessing before inference.
//!
//! Bytes are decoded locally so corrupt files fail fast with
//! [`EmbeddingError::Decode`], then normalized to an RGB PNG whose longer side
//! is at most `max_side`. The server therefore always receives the same
//! canonical payload for the same source image.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::errors::EmbeddingError;

/// Decodes, validates, downsizes and re-encodes `bytes` as PNG.
///
/// # Errors
/// - [`EmbeddingError::Decode`] for empty, truncated or unsupported input
/// - [`EmbeddingError::Internal`] if re-encoding fails
pub fn canonical_png(bytes: &[u8], max_side: u32) -> Result<Vec<u8>, EmbeddingError> {
    let img = decode(bytes)?;
    let (w, h) = img.dimensions();

    let img = if w.max(h) > max_side {
        img.resize(max_side, max_side, FilterType::Lanczos3)
    } else {
        img
    };

    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| EmbeddingError::Internal(format!("png encode: {e}")))?;
    Ok(out)
}

/// Decodes `bytes` into an image, rejecting empty and zero-sized input.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, EmbeddingError> {
    if bytes.is_empty() {
        return Err(EmbeddingError::Decode("empty image payload".into()));
    }
    let img = image::load_from_memory(bytes).map_err(|e| EmbeddingError::Decode(e.to_string()))?;
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(EmbeddingError::Decode(format!("degenerate image {w}x{h}")));
    }
    Ok(img)
}
