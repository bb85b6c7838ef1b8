//! Canonical RGB + luma representation shared by all analyzers
//!
//! Whatever form an image arrives in, analysis runs over one
//! [`CanonicalImage`]: an 8-bit RGB buffer and its BT.601 luma plane.
//! No resizing happens here; analyzers that need a working resolution
//! resample internally.

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use std::borrow::Cow;

use crate::constants::luma;
use crate::error::{AnalysisError, Result};
use crate::image_loader;

/// An image in any form accepted by the analyzer
#[derive(Debug, Clone, Copy)]
pub enum ImageInput<'a> {
    /// Encoded image bytes (JPEG, PNG, ...)
    Bytes(&'a [u8]),
    /// Base64 data URI, or a bare base64 payload
    DataUri(&'a str),
    /// Image already decoded by the caller
    Decoded(&'a DynamicImage),
    /// 8-bit RGB pixel buffer
    Rgb(&'a RgbImage),
}

/// RGB pixels plus their grayscale derivative
#[derive(Debug, Clone)]
pub struct CanonicalImage<'a> {
    rgb: Cow<'a, RgbImage>,
    gray: GrayImage,
}

impl<'a> CanonicalImage<'a> {
    /// Build from any supported input
    ///
    /// # Errors
    ///
    /// - `DecodeError` if encoded input is empty or undecodable
    /// - `InvalidImageError` if the image has zero width or height
    pub fn from_input(input: ImageInput<'a>) -> Result<Self> {
        match input {
            ImageInput::Bytes(bytes) => {
                let decoded = image_loader::decode_bytes(bytes)?;
                Self::from_owned(decoded.into_rgb8())
            }
            ImageInput::DataUri(uri) => {
                let decoded = image_loader::decode_data_uri(uri)?;
                Self::from_owned(decoded.into_rgb8())
            }
            ImageInput::Decoded(image) => Self::from_owned(image.to_rgb8()),
            ImageInput::Rgb(rgb) => Self::from_rgb(rgb),
        }
    }

    /// Borrow an RGB buffer without copying it
    pub fn from_rgb(rgb: &'a RgbImage) -> Result<Self> {
        check_dimensions(rgb)?;
        let gray = to_luma(rgb);
        Ok(Self {
            rgb: Cow::Borrowed(rgb),
            gray,
        })
    }

    fn from_owned(rgb: RgbImage) -> Result<Self> {
        check_dimensions(&rgb)?;
        let gray = to_luma(&rgb);
        Ok(Self {
            rgb: Cow::Owned(rgb),
            gray,
        })
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }
}

fn check_dimensions(rgb: &RgbImage) -> Result<()> {
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(AnalysisError::invalid_image(format!(
            "image has zero area ({width}x{height})"
        )));
    }
    Ok(())
}

/// Convert RGB to luma with BT.601 weights, rounding to nearest
pub fn to_luma(rgb: &RgbImage) -> GrayImage {
    let (width, height) = rgb.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (src, dst) in rgb.pixels().zip(gray.pixels_mut()) {
        let [r, g, b] = src.0;
        let y = luma::RED_WEIGHT * r as f32
            + luma::GREEN_WEIGHT * g as f32
            + luma::BLUE_WEIGHT * b as f32;
        *dst = Luma([y.round().clamp(0.0, 255.0) as u8]);
    }
    gray
}
