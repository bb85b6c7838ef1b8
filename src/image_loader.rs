//! Image decoding from the forms capture clients hand over
//!
//! Three encoded sources are supported:
//! - raw encoded bytes (an HTTP upload body, a camera frame saved as JPEG)
//! - base64 data URIs (`data:image/jpeg;base64,...`) produced by browser canvases
//! - files on disk
//!
//! ## Supported Formats
//!
//! JPEG, PNG, WebP, TIFF, BMP and GIF (first frame only), via the `image` crate.
//! The format is sniffed from the content, never trusted from a file name.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;

use crate::error::{AnalysisError, Result};

/// Decode an encoded image held in memory
///
/// # Errors
///
/// Returns `AnalysisError::DecodeError` if the buffer is empty or is not an
/// image in a supported format.
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(AnalysisError::decode_msg("image buffer is empty"));
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AnalysisError::decode("Failed to sniff image format", e))?;

    if reader.format().is_none() {
        return Err(AnalysisError::decode_msg("unrecognised image format"));
    }

    reader
        .decode()
        .map_err(|e| AnalysisError::decode("Failed to decode image bytes", e))
}

/// Decode a base64 data URI such as `data:image/png;base64,iVBOR...`
///
/// A bare base64 payload without the `data:` prefix is also accepted.
/// Whitespace inside the payload (line-wrapped encoders) is ignored.
pub fn decode_data_uri(uri: &str) -> Result<DynamicImage> {
    let payload = split_data_uri(uri.trim())?;
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AnalysisError::decode("Invalid base64 payload", e))?;

    decode_bytes(&bytes)
}

/// Strip the `data:<mime>;base64,` header and return the payload
fn split_data_uri(uri: &str) -> Result<&str> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Ok(uri);
    };

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AnalysisError::decode_msg("data URI has no ',' separator"))?;

    if !header.ends_with(";base64") {
        return Err(AnalysisError::decode_msg(format!(
            "data URI is not base64 encoded: data:{header}"
        )));
    }
    if !header.starts_with("image/") {
        return Err(AnalysisError::decode_msg(format!(
            "data URI does not carry an image: data:{header}"
        )));
    }

    Ok(payload)
}

/// Load and decode an image file
///
/// # Errors
///
/// Returns `AnalysisError::DecodeError` if the extension is missing or not
/// in [`supported_extensions`], or if the file cannot be read or decoded.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !is_supported_extension(ext) {
        return Err(AnalysisError::decode_msg(format!(
            "Unsupported image file extension: {}",
            path.display()
        )));
    }

    let reader = ImageReader::open(path).map_err(|e| {
        AnalysisError::decode(format!("Failed to open image file: {}", path.display()), e)
    })?;

    let reader = reader.with_guessed_format().map_err(|e| {
        AnalysisError::decode(format!("Failed to read image file: {}", path.display()), e)
    })?;

    reader.decode().map_err(|e| {
        AnalysisError::decode(format!("Failed to decode image: {}", path.display()), e)
    })
}

/// Get list of all supported file extensions
pub fn supported_extensions() -> &'static [&'static str] {
    &["jpg", "jpeg", "png", "webp", "tiff", "tif", "bmp", "gif"]
}

/// Check if a file extension is supported
pub fn is_supported_extension(ext: &str) -> bool {
    let ext_lower = ext.to_lowercase();
    supported_extensions().contains(&ext_lower.as_str())
}
