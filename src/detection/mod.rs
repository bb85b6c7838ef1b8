//! Scale-reference detection
//!
//! This module looks for objects that let a viewer infer specimen size:
//! ruler graduations (many parallel edges) and coins (a clean circle).
//! It reports presence only; no metric calibration is attempted.

use image::imageops::{self, FilterType};
use image::GrayImage;
use std::borrow::Cow;

pub mod coin;
pub mod ruler;
pub mod scale;

pub use coin::{Circle, CoinDetector};
pub use ruler::{RulerDetector, RulerEvidence};
pub use scale::{ScaleDetection, ScaleDetector, ScaleKind};

/// Downscale so the longest side is at most `max_side`, keeping aspect ratio
pub(crate) fn working_gray(gray: &GrayImage, max_side: u32) -> Cow<'_, GrayImage> {
    let (width, height) = gray.dimensions();
    let longest = width.max(height);
    if longest <= max_side || longest == 0 {
        return Cow::Borrowed(gray);
    }

    let scale = max_side as f64 / longest as f64;
    let new_w = ((width as f64 * scale).round() as u32).max(1);
    let new_h = ((height as f64 * scale).round() as u32).max(1);
    Cow::Owned(imageops::resize(gray, new_w, new_h, FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_small_images_are_borrowed() {
        let gray = GrayImage::from_pixel(320, 240, Luma([0]));
        assert!(matches!(working_gray(&gray, 800), Cow::Borrowed(_)));
    }

    #[test]
    fn test_large_images_keep_aspect() {
        let gray = GrayImage::from_pixel(1600, 1200, Luma([0]));
        let working = working_gray(&gray, 800);
        assert_eq!(working.dimensions(), (800, 600));
    }
}
