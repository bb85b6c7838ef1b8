//! Center-to-border luma contrast
//!
//! A specimen placed in the middle of the frame should stand out from the
//! surface it lies on. Pixels inside a central disc are compared against
//! pixels well outside it; the band in between is ignored.

use image::GrayImage;
use tracing::debug;

use crate::constants::rating::{CENTER_RADIUS_FRACTION, EDGE_RADIUS_FACTOR};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastMeasurement {
    /// Mean luma inside the central disc
    pub center_mean: f64,
    /// Mean luma beyond the border radius
    pub edge_mean: f64,
    /// `|center_mean - edge_mean|`, 0.0 when either region is empty
    pub center_edge_contrast: f64,
}

pub struct ContrastAnalyzer;

impl Default for ContrastAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContrastAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Compare the disc of radius `0.3 * min(w, h)` around the center with
    /// everything farther than 1.5 times that radius
    pub fn measure(&self, gray: &GrayImage) -> ContrastMeasurement {
        let (width, height) = gray.dimensions();
        let cx = width as f64 / 2.0;
        let cy = height as f64 / 2.0;
        let inner = width.min(height) as f64 * CENTER_RADIUS_FRACTION;
        let outer = inner * EDGE_RADIUS_FACTOR;
        let (inner_sq, outer_sq) = (inner * inner, outer * outer);

        let (mut center_sum, mut center_n) = (0u64, 0u64);
        let (mut edge_sum, mut edge_n) = (0u64, 0u64);
        for (x, y, pixel) in gray.enumerate_pixels() {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let d_sq = dx * dx + dy * dy;
            if d_sq < inner_sq {
                center_sum += pixel.0[0] as u64;
                center_n += 1;
            } else if d_sq > outer_sq {
                edge_sum += pixel.0[0] as u64;
                edge_n += 1;
            }
        }

        let mean = |sum: u64, n: u64| if n == 0 { 0.0 } else { sum as f64 / n as f64 };
        let center_mean = mean(center_sum, center_n);
        let edge_mean = mean(edge_sum, edge_n);
        let center_edge_contrast = if center_n == 0 || edge_n == 0 {
            0.0
        } else {
            (center_mean - edge_mean).abs()
        };

        debug!(
            center_mean,
            edge_mean,
            contrast = center_edge_contrast,
            center_pixels = center_n,
            edge_pixels = edge_n,
            "center-edge contrast measured"
        );

        ContrastMeasurement {
            center_mean,
            edge_mean,
            center_edge_contrast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_bright_specimen_on_dark_surface() {
        let gray = GrayImage::from_fn(200, 200, |x, y| {
            let dx = x as f64 - 100.0;
            let dy = y as f64 - 100.0;
            if dx * dx + dy * dy < 70.0 * 70.0 {
                Luma([200])
            } else {
                Luma([50])
            }
        });
        let m = ContrastAnalyzer::new().measure(&gray);
        assert_eq!(m.center_mean, 200.0);
        assert_eq!(m.edge_mean, 50.0);
        assert_eq!(m.center_edge_contrast, 150.0);
    }

    #[test]
    fn test_uniform_frame_has_no_contrast() {
        let m = ContrastAnalyzer::new().measure(&GrayImage::from_pixel(120, 80, Luma([90])));
        assert_eq!(m.center_edge_contrast, 0.0);
        assert_eq!(m.center_mean, 90.0);
    }

    #[test]
    fn test_single_pixel_has_no_edge_region() {
        let m = ContrastAnalyzer::new().measure(&GrayImage::from_pixel(1, 1, Luma([255])));
        assert_eq!(m.center_edge_contrast, 0.0);
    }
}
