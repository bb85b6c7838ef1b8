//! Configuration structures for the capture-quality analyzer.
//!
//! Every threshold the analyzers apply is a named, serializable parameter,
//! grouped by analyzer section.
//!
//! # Configuration Loading
//!
//! ```no_run
//! use fossil_capture::AnalyzerConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = AnalyzerConfig::from_json_file(Path::new("quality.json"))?;
//!
//! // Or start from a preset
//! let config = AnalyzerConfig::real_time();
//! # Ok::<(), fossil_capture::AnalysisError>(())
//! ```
//!
//! # Presets
//!
//! The post-capture review page and the live-view page were tuned
//! separately and disagree on several thresholds. Both are available as
//! [`AnalyzerConfig::post_capture`] and [`AnalyzerConfig::real_time`].
//! [`AnalyzerConfig::default`] takes, for every disputed value, whichever
//! setting warns more readily.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{background, lighting, rating, scale, sharpness};
use crate::error::{AnalysisError, Result};

/// Complete analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Exposure thresholds
    pub lighting: LightingConfig,

    /// Patch sharpness settings
    pub sharpness: SharpnessConfig,

    /// Background clustering settings
    pub background: BackgroundConfig,

    /// Ruler and coin detection settings
    pub scale: ScaleConfig,

    /// Five-level rating thresholds
    #[serde(default)]
    pub rating: RatingConfig,

    /// Run the analyzers concurrently on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

/// Exposure thresholds.
///
/// Pixel thresholds are 8-bit luma values; limits are fractions in 0.0-1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingConfig {
    /// Luma strictly below this is underexposed
    pub dark_threshold: u8,

    /// Fraction of underexposed pixels above which the photo is too dark
    pub dark_pct_limit: f64,

    /// Luma strictly above this is overexposed
    pub bright_threshold: u8,

    /// Fraction of overexposed pixels above which the photo has glare
    pub bright_pct_limit: f64,
}

/// Patch sharpness settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharpnessConfig {
    /// Patch edge length in pixels
    pub patch_size: u32,

    /// Laplacian variance below which the worst patch counts as blurry
    pub min_sharpness: f64,
}

/// Background clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    /// Square working resolution the image is resized to before clustering
    pub working_size: u32,

    /// Number of color clusters
    pub clusters: usize,

    /// k-means restarts; the run with the lowest inertia is kept
    pub restarts: usize,

    /// Iteration cap per restart
    pub max_iterations: usize,

    /// Seed for center initialisation
    pub seed: u64,

    /// Dominant-cluster share (0.0-1.0) below which the background is cluttered
    pub min_dominant_pct: f64,
}

/// Ruler and coin detection settings.
///
/// Lengths and radii are in pixels of the working image, whose longest side
/// is at most `working_max_side`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    pub working_max_side: u32,
    pub canny_low: f32,
    pub canny_high: f32,

    /// Hough vote threshold and minimum contiguous edge run of a line segment
    pub min_line_length: u32,

    /// Missing edge samples tolerated inside one segment run
    #[serde(default = "default_max_line_gap")]
    pub max_line_gap: u32,

    pub suppression_radius: u32,

    /// Orientation bins over [-90°, 90°); must divide 180
    pub angle_bins: usize,

    /// A bin holding more lines than this declares a ruler
    pub min_bin_count: usize,

    pub blur_sigma: f32,
    pub min_radius: u32,
    pub max_radius: u32,
    pub accumulator_threshold: u32,
    pub min_center_distance: f32,

    /// Fraction of the circumference that must lie on edge pixels
    pub min_edge_support: f32,
}

fn default_max_line_gap() -> u32 {
    scale::MAX_LINE_GAP
}

/// Thresholds mapping raw scores to a [`Rating`](crate::report::Rating).
///
/// Each array must be strictly ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    /// Mean luma (0-255)
    pub lighting_mean: [f64; 4],

    /// Laplacian variance of the center window
    pub sharpness: [f64; 4],

    /// Absolute center-to-edge mean luma difference
    pub contrast: [f64; 4],
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            lighting_mean: rating::LIGHTING_MEAN_THRESHOLDS,
            sharpness: rating::SHARPNESS_THRESHOLDS,
            contrast: rating::CONTRAST_THRESHOLDS,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            dark_threshold: lighting::DARK_THRESHOLD,
            dark_pct_limit: lighting::REAL_TIME_DARK_LIMIT,
            bright_threshold: lighting::POST_CAPTURE_BRIGHT_THRESHOLD,
            bright_pct_limit: lighting::REAL_TIME_BRIGHT_LIMIT,
        }
    }
}

impl Default for SharpnessConfig {
    fn default() -> Self {
        Self {
            patch_size: sharpness::POST_CAPTURE_PATCH_SIZE,
            min_sharpness: sharpness::REAL_TIME_MIN_SHARPNESS,
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            working_size: background::POST_CAPTURE_WORKING_SIZE,
            clusters: background::CLUSTERS,
            restarts: background::RESTARTS,
            max_iterations: background::MAX_ITERATIONS,
            seed: background::POST_CAPTURE_SEED,
            min_dominant_pct: background::MIN_DOMINANT_SHARE,
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            working_max_side: scale::WORKING_MAX_SIDE,
            canny_low: scale::CANNY_LOW_THRESHOLD,
            canny_high: scale::CANNY_HIGH_THRESHOLD,
            min_line_length: scale::MIN_LINE_LENGTH,
            max_line_gap: scale::MAX_LINE_GAP,
            suppression_radius: scale::LINE_SUPPRESSION_RADIUS,
            angle_bins: scale::ANGLE_BINS,
            min_bin_count: scale::MIN_BIN_COUNT,
            blur_sigma: scale::CIRCLE_BLUR_SIGMA,
            min_radius: scale::MIN_RADIUS,
            max_radius: scale::MAX_RADIUS,
            accumulator_threshold: scale::ACCUMULATOR_THRESHOLD,
            min_center_distance: scale::MIN_CENTER_DISTANCE,
            min_edge_support: scale::MIN_EDGE_SUPPORT,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            lighting: LightingConfig::default(),
            sharpness: SharpnessConfig::default(),
            background: BackgroundConfig::default(),
            scale: ScaleConfig::default(),
            rating: RatingConfig::default(),
            parallel: default_parallel(),
        }
    }
}

impl AnalyzerConfig {
    /// Thresholds of the post-capture review page
    pub fn post_capture() -> Self {
        Self {
            lighting: LightingConfig {
                dark_threshold: lighting::DARK_THRESHOLD,
                dark_pct_limit: lighting::POST_CAPTURE_DARK_LIMIT,
                bright_threshold: lighting::POST_CAPTURE_BRIGHT_THRESHOLD,
                bright_pct_limit: lighting::POST_CAPTURE_BRIGHT_LIMIT,
            },
            sharpness: SharpnessConfig {
                patch_size: sharpness::POST_CAPTURE_PATCH_SIZE,
                min_sharpness: sharpness::POST_CAPTURE_MIN_SHARPNESS,
            },
            background: BackgroundConfig {
                working_size: background::POST_CAPTURE_WORKING_SIZE,
                seed: background::POST_CAPTURE_SEED,
                ..BackgroundConfig::default()
            },
            ..Self::default()
        }
    }

    /// Thresholds of the real-time live-view page
    pub fn real_time() -> Self {
        Self {
            lighting: LightingConfig {
                dark_threshold: lighting::DARK_THRESHOLD,
                dark_pct_limit: lighting::REAL_TIME_DARK_LIMIT,
                bright_threshold: lighting::REAL_TIME_BRIGHT_THRESHOLD,
                bright_pct_limit: lighting::REAL_TIME_BRIGHT_LIMIT,
            },
            sharpness: SharpnessConfig {
                patch_size: sharpness::REAL_TIME_PATCH_SIZE,
                min_sharpness: sharpness::REAL_TIME_MIN_SHARPNESS,
            },
            background: BackgroundConfig {
                working_size: background::REAL_TIME_WORKING_SIZE,
                seed: background::REAL_TIME_SEED,
                ..BackgroundConfig::default()
            },
            ..Self::default()
        }
    }

    /// Check every parameter for a usable value
    pub fn validate(&self) -> Result<()> {
        let fraction = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(AnalysisError::invalid_parameter(name, value))
            }
        };

        fraction("lighting.dark_pct_limit", self.lighting.dark_pct_limit)?;
        fraction("lighting.bright_pct_limit", self.lighting.bright_pct_limit)?;
        fraction("background.min_dominant_pct", self.background.min_dominant_pct)?;

        if self.sharpness.patch_size == 0 {
            return Err(AnalysisError::invalid_parameter("sharpness.patch_size", 0));
        }
        if !(self.sharpness.min_sharpness >= 0.0) {
            return Err(AnalysisError::invalid_parameter(
                "sharpness.min_sharpness",
                self.sharpness.min_sharpness,
            ));
        }

        let bg = &self.background;
        if bg.working_size == 0 {
            return Err(AnalysisError::invalid_parameter("background.working_size", 0));
        }
        if bg.clusters == 0 {
            return Err(AnalysisError::invalid_parameter("background.clusters", 0));
        }
        if bg.restarts == 0 {
            return Err(AnalysisError::invalid_parameter("background.restarts", 0));
        }
        if bg.max_iterations == 0 {
            return Err(AnalysisError::invalid_parameter("background.max_iterations", 0));
        }

        let sc = &self.scale;
        if sc.working_max_side == 0 || sc.working_max_side > scale::MAX_WORKING_SIDE {
            return Err(AnalysisError::invalid_parameter(
                "scale.working_max_side",
                sc.working_max_side,
            ));
        }
        if sc.canny_low > sc.canny_high {
            return Err(AnalysisError::invalid_parameter(
                "scale.canny_low",
                format!("{} > canny_high {}", sc.canny_low, sc.canny_high),
            ));
        }
        if sc.angle_bins == 0 || 180 % sc.angle_bins != 0 {
            return Err(AnalysisError::invalid_parameter("scale.angle_bins", sc.angle_bins));
        }
        if sc.min_radius == 0 || sc.min_radius > sc.max_radius {
            return Err(AnalysisError::invalid_parameter(
                "scale.min_radius",
                format!("{} (max_radius {})", sc.min_radius, sc.max_radius),
            ));
        }
        if !(sc.blur_sigma > 0.0) {
            return Err(AnalysisError::invalid_parameter("scale.blur_sigma", sc.blur_sigma));
        }

        let ascending = |name: &str, thresholds: &[f64; 4]| {
            let ok = thresholds.iter().all(|t| t.is_finite())
                && thresholds.windows(2).all(|w| w[0] < w[1]);
            if ok {
                Ok(())
            } else {
                Err(AnalysisError::invalid_parameter(name, format!("{thresholds:?}")))
            }
        };
        ascending("rating.lighting_mean", &self.rating.lighting_mean)?;
        ascending("rating.sharpness", &self.rating.sharpness)?;
        ascending("rating.contrast", &self.rating.contrast)?;

        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::config(format!("Failed to read {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            AnalysisError::config(format!("Failed to parse {}", path.display()), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::config("Failed to serialize configuration", e))?;
        std::fs::write(path, json).map_err(|e| {
            AnalysisError::config(format!("Failed to write {}", path.display()), e)
        })?;
        Ok(())
    }
}
