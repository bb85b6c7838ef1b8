//! Worst-patch focus measurement using Laplacian variance
//!
//! The grayscale image is tiled into non-overlapping `P×P` patches (the last
//! row and column are truncated to what remains). The reported score is the
//! minimum over patches, so one out-of-focus corner fails the whole frame
//! even when the rest is crisp.
//!
//! The quick check instead scores only the middle half of each axis, where
//! the specimen is expected; see [`center_laplacian_variance`].

use image::{imageops, GrayImage};
use imageproc::filter::laplacian_filter;
use tracing::debug;

use crate::config::SharpnessConfig;
use crate::constants::rating::{CENTER_WINDOW_END, CENTER_WINDOW_START};
use crate::error::{AnalysisError, Result};

/// Sharpness score of one patch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchScore {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Variance of the Laplacian response over the patch
    pub variance: f64,
}

/// Result of the sharpness pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharpnessMeasurement {
    /// Lowest patch variance
    pub min_sharpness: f64,
    /// The patch that produced `min_sharpness`
    pub worst_patch: PatchScore,
    /// Number of non-empty patches scored
    pub patch_count: usize,
    /// Laplacian variance over the center window
    pub center_sharpness: f64,
}

/// Patch-tiling sharpness analyzer
pub struct SharpnessAnalyzer {
    config: SharpnessConfig,
}

impl Default for SharpnessAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SharpnessAnalyzer {
    pub fn new() -> Self {
        Self {
            config: SharpnessConfig::default(),
        }
    }

    pub fn with_config(config: SharpnessConfig) -> Self {
        Self { config }
    }

    /// Score every non-empty patch in row-major order
    pub fn patch_scores(&self, gray: &GrayImage) -> Vec<PatchScore> {
        let (width, height) = gray.dimensions();
        let step = self.config.patch_size.max(1);

        let mut scores = Vec::new();
        for y in (0..height).step_by(step as usize) {
            for x in (0..width).step_by(step as usize) {
                let patch_w = step.min(width - x);
                let patch_h = step.min(height - y);
                if patch_w == 0 || patch_h == 0 {
                    continue;
                }

                let patch = imageops::crop_imm(gray, x, y, patch_w, patch_h).to_image();
                scores.push(PatchScore {
                    x,
                    y,
                    width: patch_w,
                    height: patch_h,
                    variance: laplacian_variance(&patch),
                });
            }
        }
        scores
    }

    /// Find the least sharp patch
    ///
    /// # Errors
    ///
    /// Returns `InvalidImageError` when the image yields no non-empty patch.
    pub fn measure(&self, gray: &GrayImage) -> Result<SharpnessMeasurement> {
        let scores = self.patch_scores(gray);
        let worst = scores
            .iter()
            .copied()
            .min_by(|a, b| a.variance.total_cmp(&b.variance))
            .ok_or_else(|| {
                let (w, h) = gray.dimensions();
                AnalysisError::invalid_image(format!("no non-empty patch in {w}x{h} image"))
            })?;

        let center_sharpness = center_laplacian_variance(gray);

        debug!(
            min_sharpness = worst.variance,
            center_sharpness,
            patches = scores.len(),
            worst_x = worst.x,
            worst_y = worst.y,
            "sharpness measured"
        );

        Ok(SharpnessMeasurement {
            min_sharpness: worst.variance,
            worst_patch: worst,
            patch_count: scores.len(),
            center_sharpness,
        })
    }

    pub fn is_blurry(&self, measurement: &SharpnessMeasurement) -> bool {
        measurement.min_sharpness < self.config.min_sharpness
    }
}

/// Population variance of the 4-neighbour Laplacian response
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let response = laplacian_filter(gray);
    population_variance(response.as_raw().iter().map(|&v| v as f64))
}

/// Laplacian variance over the middle half of each axis
///
/// Neighbours are read from the full image, so window pixels on the image
/// border are skipped rather than clamped. Returns 0.0 when the window is
/// empty.
pub fn center_laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    let window = |len: u32| {
        let start = (len as f64 * CENTER_WINDOW_START).floor() as u32;
        let end = (len as f64 * CENTER_WINDOW_END).floor() as u32;
        start.max(1)..end.saturating_sub(1).min(len.saturating_sub(1))
    };
    let (xs, ys) = (window(width), window(height));
    if xs.is_empty() || ys.is_empty() {
        return 0.0;
    }

    let response = laplacian_filter(gray);
    population_variance(
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .map(|(x, y)| response.get_pixel(x, y).0[0] as f64),
    )
}

fn population_variance(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let (n, sum) = values.clone().fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if n == 0 {
        return 0.0;
    }
    let mean = sum / n as f64;
    let variance = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    variance.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn checkerboard(width: u32, height: u32, low: u8, high: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([low])
            } else {
                Luma([high])
            }
        })
    }

    fn analyzer(patch_size: u32) -> SharpnessAnalyzer {
        SharpnessAnalyzer::with_config(SharpnessConfig {
            patch_size,
            min_sharpness: 100.0,
        })
    }

    #[test]
    fn test_uniform_image_has_zero_sharpness() {
        let gray = GrayImage::from_pixel(250, 250, Luma([128]));
        let m = analyzer(100).measure(&gray).unwrap();
        assert_eq!(m.min_sharpness, 0.0);
        assert!(analyzer(100).is_blurry(&m));
    }

    #[test]
    fn test_checkerboard_is_sharp() {
        let gray = checkerboard(200, 200, 100, 156);
        let m = analyzer(100).measure(&gray).unwrap();
        assert!(m.min_sharpness > 100.0, "got {}", m.min_sharpness);
        assert!(!analyzer(100).is_blurry(&m));
    }

    #[test]
    fn test_truncated_edge_patches() {
        let gray = GrayImage::from_pixel(250, 130, Luma([0]));
        let scores = analyzer(100).patch_scores(&gray);
        assert_eq!(scores.len(), 6);
        let last = scores.last().unwrap();
        assert_eq!((last.x, last.y, last.width, last.height), (200, 100, 50, 30));
    }

    #[test]
    fn test_single_flat_patch_fails_whole_image() {
        // Sharp everywhere except the bottom-right patch
        let mut gray = checkerboard(300, 300, 60, 200);
        for y in 200..300 {
            for x in 200..300 {
                gray.put_pixel(x, y, Luma([128]));
            }
        }
        let m = analyzer(100).measure(&gray).unwrap();
        assert_eq!(m.min_sharpness, 0.0);
        assert_eq!((m.worst_patch.x, m.worst_patch.y), (200, 200));
        assert_eq!(m.patch_count, 9);
    }

    #[test]
    fn test_minimum_bounds_every_patch() {
        let gray = GrayImage::from_fn(230, 170, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let a = analyzer(64);
        let m = a.measure(&gray).unwrap();
        for score in a.patch_scores(&gray) {
            assert!(m.min_sharpness <= score.variance);
        }
        assert!(m.min_sharpness >= 0.0);
    }

    #[test]
    fn test_center_window_ignores_blurry_border() {
        // crisp texture in the middle, flat frame around it
        let gray = GrayImage::from_fn(200, 200, |x, y| {
            let inside = (60..140).contains(&x) && (60..140).contains(&y);
            if inside && (x + y) % 2 == 0 {
                Luma([180])
            } else if inside {
                Luma([60])
            } else {
                Luma([120])
            }
        });
        let m = analyzer(50).measure(&gray).unwrap();
        assert!(m.center_sharpness > 1000.0, "got {}", m.center_sharpness);
        assert_eq!(m.min_sharpness, 0.0);
    }

    #[test]
    fn test_center_window_of_flat_and_tiny_images() {
        assert_eq!(center_laplacian_variance(&GrayImage::from_pixel(50, 50, Luma([90]))), 0.0);
        assert_eq!(center_laplacian_variance(&GrayImage::from_pixel(3, 3, Luma([90]))), 0.0);
        assert_eq!(center_laplacian_variance(&GrayImage::new(1, 1)), 0.0);
    }

    #[test]
    fn test_empty_image_is_invalid() {
        let gray = GrayImage::new(0, 0);
        assert!(matches!(
            analyzer(100).measure(&gray),
            Err(AnalysisError::InvalidImageError { .. })
        ));
    }
}
