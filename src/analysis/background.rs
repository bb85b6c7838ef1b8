//! Background uniformity via dominant color-cluster share
//!
//! The image is resized to a small square working resolution, its pixels
//! are partitioned into a fixed number of color clusters, and the share of
//! the largest cluster is reported. A plain backdrop collapses into one
//! dominant cluster; clutter spreads samples across all of them.

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::{debug, warn};

use crate::analysis::cluster::{KMeans, Sample};
use crate::config::BackgroundConfig;

/// Result of the background pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundMeasurement {
    /// Share (0.0-1.0) of samples in the largest cluster
    pub dominant_fraction: f64,
    /// Number of clusters actually formed (fewer than requested on flat images)
    pub clusters_found: usize,
    /// True when clustering could not run and the uniform fallback was used
    pub fallback: bool,
}

impl BackgroundMeasurement {
    fn uniform_fallback() -> Self {
        Self {
            dominant_fraction: 1.0,
            clusters_found: 0,
            fallback: true,
        }
    }
}

/// Background analyzer applying [`BackgroundConfig`]
pub struct BackgroundAnalyzer {
    config: BackgroundConfig,
}

impl Default for BackgroundAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundAnalyzer {
    pub fn new() -> Self {
        Self {
            config: BackgroundConfig::default(),
        }
    }

    pub fn with_config(config: BackgroundConfig) -> Self {
        Self { config }
    }

    /// Measure dominant-cluster share
    ///
    /// Never fails: a numerically degenerate input is treated as fully
    /// uniform so the remaining checks still report.
    pub fn measure(&self, rgb: &RgbImage) -> BackgroundMeasurement {
        let samples = self.samples(rgb);

        let kmeans = KMeans {
            clusters: self.config.clusters,
            restarts: self.config.restarts,
            max_iterations: self.config.max_iterations,
            seed: self.config.seed,
        };

        let Some(clustering) = kmeans.fit(&samples) else {
            warn!(
                samples = samples.len(),
                "background clustering had no input, assuming uniform"
            );
            return BackgroundMeasurement::uniform_fallback();
        };

        let dominant = clustering.dominant_share();
        if !dominant.is_finite() {
            warn!("background clustering produced a non-finite share, assuming uniform");
            return BackgroundMeasurement::uniform_fallback();
        }

        debug!(
            dominant,
            clusters = clustering.centers.len(),
            iterations = clustering.iterations,
            inertia = clustering.inertia,
            "background measured"
        );

        BackgroundMeasurement {
            dominant_fraction: dominant.clamp(0.0, 1.0),
            clusters_found: clustering.centers.len(),
            fallback: false,
        }
    }

    pub fn is_cluttered(&self, measurement: &BackgroundMeasurement) -> bool {
        measurement.dominant_fraction < self.config.min_dominant_pct
    }

    /// Resize to the working resolution and flatten to RGB samples
    fn samples(&self, rgb: &RgbImage) -> Vec<Sample> {
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let size = self.config.working_size;
        let small = imageops::resize(rgb, size, size, FilterType::Triangle);
        small
            .pixels()
            .map(|p| [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_solid_color_is_fully_uniform() {
        let rgb = RgbImage::from_pixel(300, 200, Rgb([180, 160, 40]));
        let analyzer = BackgroundAnalyzer::new();
        let m = analyzer.measure(&rgb);
        assert_eq!(m.dominant_fraction, 1.0);
        assert_eq!(m.clusters_found, 1);
        assert!(!analyzer.is_cluttered(&m));
    }

    #[test]
    fn test_three_equal_stripes_are_cluttered() {
        let rgb = RgbImage::from_fn(300, 300, |x, _| match x / 100 {
            0 => Rgb([220, 30, 30]),
            1 => Rgb([30, 220, 30]),
            _ => Rgb([30, 30, 220]),
        });
        let analyzer = BackgroundAnalyzer::new();
        let m = analyzer.measure(&rgb);
        assert!(m.dominant_fraction < 0.5, "got {}", m.dominant_fraction);
        assert!(analyzer.is_cluttered(&m));
    }

    #[test]
    fn test_mostly_plain_backdrop() {
        // 20x20 dark specimen in the middle of a 100x100 yellow card
        let rgb = RgbImage::from_fn(100, 100, |x, y| {
            if (40..60).contains(&x) && (40..60).contains(&y) {
                Rgb([60, 50, 40])
            } else {
                Rgb([230, 200, 60])
            }
        });
        let m = BackgroundAnalyzer::new().measure(&rgb);
        assert!(m.dominant_fraction > 0.9, "got {}", m.dominant_fraction);
    }

    #[test]
    fn test_repeatable() {
        let rgb = RgbImage::from_fn(120, 90, |x, y| {
            Rgb([(x * 2) as u8, (y * 3) as u8, ((x + y) % 256) as u8])
        });
        let analyzer = BackgroundAnalyzer::new();
        assert_eq!(analyzer.measure(&rgb), analyzer.measure(&rgb));
    }

    #[test]
    fn test_empty_image_falls_back() {
        let m = BackgroundAnalyzer::new().measure(&RgbImage::new(0, 0));
        assert!(m.fallback);
        assert_eq!(m.dominant_fraction, 1.0);
    }
}
