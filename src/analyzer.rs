//! Quality report assembly
//!
//! [`QualityAnalyzer`] preprocesses the input once, runs the checks
//! over the shared read-only canonical image (concurrently when
//! `parallel` is set), and merges their verdicts in fixed order.
//! Preprocessing errors propagate before any check runs.

use image::{DynamicImage, RgbImage};
use tracing::info;

use crate::analysis::{
    BackgroundAnalyzer, BackgroundMeasurement, ContrastAnalyzer, ContrastMeasurement,
    LightingAnalyzer, LightingMeasurement, SharpnessAnalyzer, SharpnessMeasurement,
};
use crate::config::AnalyzerConfig;
use crate::detection::{ScaleDetection, ScaleDetector, ScaleKind};
use crate::error::Result;
use crate::preprocess::{CanonicalImage, ImageInput};
use crate::report::{
    round2, to_percent, Check, FeedbackItem, Metrics, QualityReport, Rating, Ratings,
};

/// Photographer-facing feedback text
pub mod messages {
    pub const TOO_DARK: &str = "Many areas are too dark: add more light.";
    pub const LIGHTING_OK: &str = "Lighting is adequate.";
    pub const OVEREXPOSED: &str = "Overexposed regions detected: reduce glare.";
    pub const EXPOSURE_OK: &str = "No major overexposure.";
    pub const BLURRY: &str = "Some regions are blurry: ensure steady focus.";
    pub const SHARP: &str = "Image is sharp across all regions.";
    pub const CLUTTERED: &str = "Background is cluttered: use a uniform surface.";
    pub const BACKGROUND_OK: &str = "Background appears uniform.";
    pub const RULER_FOUND: &str = "Scale reference detected (ruler).";
    pub const COIN_FOUND: &str = "Scale reference detected (coin).";
    pub const NO_SCALE: &str = "No scale reference detected: add a coin or ruler for size reference.";
}

/// Stateless capture-quality analyzer
pub struct QualityAnalyzer {
    config: AnalyzerConfig,
    lighting: LightingAnalyzer,
    contrast: ContrastAnalyzer,
    sharpness: SharpnessAnalyzer,
    background: BackgroundAnalyzer,
    scale: ScaleDetector,
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self::build(AnalyzerConfig::default())
    }
}

struct Measurements {
    lighting: LightingMeasurement,
    contrast: ContrastMeasurement,
    sharpness: Result<SharpnessMeasurement>,
    background: BackgroundMeasurement,
    scale: ScaleDetection,
}

impl QualityAnalyzer {
    /// Create an analyzer after validating `config`
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: AnalyzerConfig) -> Self {
        Self {
            lighting: LightingAnalyzer::with_config(config.lighting.clone()),
            contrast: ContrastAnalyzer::new(),
            sharpness: SharpnessAnalyzer::with_config(config.sharpness.clone()),
            background: BackgroundAnalyzer::with_config(config.background.clone()),
            scale: ScaleDetector::with_config(config.scale.clone()),
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze an 8-bit RGB buffer
    pub fn analyze(&self, image: &RgbImage) -> Result<QualityReport> {
        self.analyze_canonical(&CanonicalImage::from_rgb(image)?)
    }

    /// Analyze an image decoded by the caller
    pub fn analyze_dynamic(&self, image: &DynamicImage) -> Result<QualityReport> {
        self.analyze_input(ImageInput::Decoded(image))
    }

    /// Analyze any supported input form
    pub fn analyze_input(&self, input: ImageInput<'_>) -> Result<QualityReport> {
        self.analyze_canonical(&CanonicalImage::from_input(input)?)
    }

    pub fn analyze_canonical(&self, image: &CanonicalImage<'_>) -> Result<QualityReport> {
        let measurements = if self.config.parallel {
            self.measure_parallel(image)
        } else {
            self.measure_sequential(image)
        };
        let sharpness = measurements.sharpness?;

        let lighting = &measurements.lighting;
        let contrast = &measurements.contrast;
        let background = &measurements.background;
        let scale = measurements.scale;

        let mut feedback = Vec::with_capacity(5);

        // Lighting
        feedback.push(if self.lighting.is_too_dark(lighting) {
            FeedbackItem::warning(Check::Lighting, messages::TOO_DARK)
        } else {
            FeedbackItem::ok(Check::Lighting, messages::LIGHTING_OK)
        });
        feedback.push(if self.lighting.is_overexposed(lighting) {
            FeedbackItem::warning(Check::Exposure, messages::OVEREXPOSED)
        } else {
            FeedbackItem::ok(Check::Exposure, messages::EXPOSURE_OK)
        });

        // Sharpness
        feedback.push(if self.sharpness.is_blurry(&sharpness) {
            FeedbackItem::warning(Check::Sharpness, messages::BLURRY)
        } else {
            FeedbackItem::ok(Check::Sharpness, messages::SHARP)
        });

        // Background
        feedback.push(if self.background.is_cluttered(background) {
            FeedbackItem::warning(Check::Background, messages::CLUTTERED)
        } else {
            FeedbackItem::ok(Check::Background, messages::BACKGROUND_OK)
        });

        // Scale reference
        feedback.push(match scale.kind {
            ScaleKind::Ruler => FeedbackItem::ok(Check::Scale, messages::RULER_FOUND),
            ScaleKind::Coin => FeedbackItem::ok(Check::Scale, messages::COIN_FOUND),
            ScaleKind::None => FeedbackItem::warning(Check::Scale, messages::NO_SCALE),
        });

        let metrics = Metrics {
            dark_pct: to_percent(lighting.dark_fraction),
            bright_pct: to_percent(lighting.bright_fraction),
            min_sharpness: sharpness.min_sharpness,
            dominant_bg_pct: to_percent(background.dominant_fraction),
        };

        let thresholds = &self.config.rating;
        let ratings = Ratings {
            mean_luma: round2(lighting.mean_luma),
            lighting_rating: Rating::from_thresholds(lighting.mean_luma, &thresholds.lighting_mean),
            center_edge_contrast: round2(contrast.center_edge_contrast),
            contrast_rating: Rating::from_thresholds(
                contrast.center_edge_contrast,
                &thresholds.contrast,
            ),
            center_sharpness: round2(sharpness.center_sharpness),
            sharpness_rating: Rating::from_thresholds(
                sharpness.center_sharpness,
                &thresholds.sharpness,
            ),
        };

        let report = QualityReport {
            feedback,
            metrics,
            scale,
            ratings,
        };

        info!(
            ready = report.is_capture_ready(),
            warnings = report.warnings().count(),
            dark_pct = metrics.dark_pct,
            bright_pct = metrics.bright_pct,
            min_sharpness = metrics.min_sharpness,
            dominant_bg_pct = metrics.dominant_bg_pct,
            scale = %scale.kind,
            lighting = %ratings.lighting_rating,
            contrast = %ratings.contrast_rating,
            sharpness = %ratings.sharpness_rating,
            "capture quality analyzed"
        );

        Ok(report)
    }

    fn measure_sequential(&self, image: &CanonicalImage<'_>) -> Measurements {
        Measurements {
            lighting: self.lighting.measure(image.gray()),
            contrast: self.contrast.measure(image.gray()),
            sharpness: self.sharpness.measure(image.gray()),
            background: self.background.measure(image.rgb()),
            scale: self.scale.detect(image.gray()),
        }
    }

    fn measure_parallel(&self, image: &CanonicalImage<'_>) -> Measurements {
        let (((lighting, contrast), sharpness), (background, scale)) = rayon::join(
            || {
                rayon::join(
                    || {
                        (
                            self.lighting.measure(image.gray()),
                            self.contrast.measure(image.gray()),
                        )
                    },
                    || self.sharpness.measure(image.gray()),
                )
            },
            || {
                rayon::join(
                    || self.background.measure(image.rgb()),
                    || self.scale.detect(image.gray()),
                )
            },
        );
        Measurements {
            lighting,
            contrast,
            sharpness,
            background,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::report::Severity;
    use image::Rgb;

    fn sequential(mut config: AnalyzerConfig) -> QualityAnalyzer {
        config.parallel = false;
        QualityAnalyzer::new(config).unwrap()
    }

    #[test]
    fn test_feedback_order_is_fixed() {
        let rgb = RgbImage::from_pixel(120, 120, Rgb([128, 128, 128]));
        let report = QualityAnalyzer::default().analyze(&rgb).unwrap();
        let checks: Vec<Check> = report.feedback.iter().map(|f| f.check).collect();
        assert_eq!(
            checks,
            vec![
                Check::Lighting,
                Check::Exposure,
                Check::Sharpness,
                Check::Background,
                Check::Scale
            ]
        );
    }

    #[test]
    fn test_solid_color_verdicts() {
        let rgb = RgbImage::from_pixel(200, 150, Rgb([128, 128, 128]));
        let report = sequential(AnalyzerConfig::post_capture()).analyze(&rgb).unwrap();
        assert_eq!(report.metrics.dominant_bg_pct, 100.0);
        assert_eq!(report.metrics.min_sharpness, 0.0);
        assert_eq!(report.feedback[2].severity, Severity::Warning);
        assert_eq!(report.feedback[3].severity, Severity::Ok);
        assert_eq!(report.feedback[4].message, messages::NO_SCALE);
    }

    #[test]
    fn test_solid_color_ratings() {
        let rgb = RgbImage::from_pixel(200, 150, Rgb([128, 128, 128]));
        let report = sequential(AnalyzerConfig::default()).analyze(&rgb).unwrap();
        let r = report.ratings;
        assert_eq!(r.mean_luma, 128.0);
        assert_eq!(r.lighting_rating, Rating::Good);
        assert_eq!(r.center_edge_contrast, 0.0);
        assert_eq!(r.contrast_rating, Rating::VeryPoor);
        assert_eq!(r.center_sharpness, 0.0);
        assert_eq!(r.sharpness_rating, Rating::VeryPoor);
        assert_eq!(report.feedback.len(), 5);
    }

    #[test]
    fn test_rating_thresholds_come_from_config() {
        let rgb = RgbImage::from_pixel(100, 100, Rgb([128, 128, 128]));
        let mut config = AnalyzerConfig::default();
        config.rating.lighting_mean = [10.0, 20.0, 30.0, 40.0];
        let report = sequential(config).analyze(&rgb).unwrap();
        assert_eq!(report.ratings.lighting_rating, Rating::VeryGood);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let rgb = RgbImage::from_fn(160, 120, |x, y| {
            Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x ^ y) % 256) as u8])
        });
        let mut config = AnalyzerConfig::default();
        config.parallel = true;
        let parallel = QualityAnalyzer::new(config.clone()).unwrap().analyze(&rgb).unwrap();
        config.parallel = false;
        let sequential = QualityAnalyzer::new(config).unwrap().analyze(&rgb).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AnalyzerConfig::default();
        config.background.clusters = 0;
        assert!(matches!(
            QualityAnalyzer::new(config),
            Err(AnalysisError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_zero_area_propagates() {
        let rgb = RgbImage::new(0, 0);
        assert!(matches!(
            QualityAnalyzer::default().analyze(&rgb),
            Err(AnalysisError::InvalidImageError { .. })
        ));
    }
}
