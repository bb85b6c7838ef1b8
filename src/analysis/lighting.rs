//! Exposure check by counting under- and overexposed pixels
//!
//! The same pass also yields the mean luma graded by the quick check.

use image::GrayImage;
use tracing::debug;

use crate::config::LightingConfig;

/// Fractions (0.0-1.0) of pixels outside the usable luma range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingMeasurement {
    pub dark_fraction: f64,
    pub bright_fraction: f64,
    /// Mean luma, 0-255
    pub mean_luma: f64,
}

/// Lighting analyzer applying [`LightingConfig`] thresholds
pub struct LightingAnalyzer {
    config: LightingConfig,
}

impl Default for LightingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LightingAnalyzer {
    pub fn new() -> Self {
        Self {
            config: LightingConfig::default(),
        }
    }

    pub fn with_config(config: LightingConfig) -> Self {
        Self { config }
    }

    /// Count pixels with luma below `dark_threshold` and above `bright_threshold`
    pub fn measure(&self, gray: &GrayImage) -> LightingMeasurement {
        let total = gray.as_raw().len();
        if total == 0 {
            return LightingMeasurement {
                dark_fraction: 0.0,
                bright_fraction: 0.0,
                mean_luma: 0.0,
            };
        }

        let (mut dark, mut bright, mut sum) = (0usize, 0usize, 0u64);
        for &value in gray.as_raw() {
            sum += value as u64;
            if value < self.config.dark_threshold {
                dark += 1;
            }
            if value > self.config.bright_threshold {
                bright += 1;
            }
        }

        let measurement = LightingMeasurement {
            dark_fraction: dark as f64 / total as f64,
            bright_fraction: bright as f64 / total as f64,
            mean_luma: sum as f64 / total as f64,
        };
        debug!(
            dark = measurement.dark_fraction,
            bright = measurement.bright_fraction,
            mean = measurement.mean_luma,
            "lighting measured"
        );
        measurement
    }

    pub fn is_too_dark(&self, measurement: &LightingMeasurement) -> bool {
        measurement.dark_fraction > self.config.dark_pct_limit
    }

    pub fn is_overexposed(&self, measurement: &LightingMeasurement) -> bool {
        measurement.bright_fraction > self.config.bright_pct_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn half_and_half(low: u8, high: u8) -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([low]) } else { Luma([high]) })
    }

    #[test]
    fn test_counts_dark_and_bright() {
        let analyzer = LightingAnalyzer::new();
        let m = analyzer.measure(&half_and_half(10, 250));
        assert_eq!(m.dark_fraction, 0.5);
        assert_eq!(m.bright_fraction, 0.5);
        assert_eq!(m.mean_luma, 130.0);
        assert!(analyzer.is_too_dark(&m));
        assert!(analyzer.is_overexposed(&m));
    }

    #[test]
    fn test_thresholds_are_strict() {
        let config = LightingConfig {
            dark_threshold: 50,
            dark_pct_limit: 0.20,
            bright_threshold: 220,
            bright_pct_limit: 0.20,
        };
        let analyzer = LightingAnalyzer::with_config(config);
        let m = analyzer.measure(&half_and_half(50, 220));
        assert_eq!(m.dark_fraction, 0.0);
        assert_eq!(m.bright_fraction, 0.0);
    }

    #[test]
    fn test_limit_is_exclusive() {
        let analyzer = LightingAnalyzer::with_config(LightingConfig {
            dark_threshold: 50,
            dark_pct_limit: 0.5,
            bright_threshold: 220,
            bright_pct_limit: 0.5,
        });
        let m = analyzer.measure(&half_and_half(0, 255));
        assert!(!analyzer.is_too_dark(&m));
        assert!(!analyzer.is_overexposed(&m));
    }

    #[test]
    fn test_bright_threshold_variants() {
        let img = GrayImage::from_pixel(4, 4, Luma([230]));
        let post = LightingAnalyzer::with_config(LightingConfig {
            bright_threshold: 220,
            ..LightingConfig::default()
        });
        let live = LightingAnalyzer::with_config(LightingConfig {
            bright_threshold: 240,
            ..LightingConfig::default()
        });
        assert_eq!(post.measure(&img).bright_fraction, 1.0);
        assert_eq!(live.measure(&img).bright_fraction, 0.0);
    }
}
