//! # Fossil Capture
//!
//! Decides whether a photograph of a fossil specimen is ready for archival
//! submission, and tells the photographer what to fix if it is not.
//!
//! Four independent checks run over each image:
//! - Lighting: share of under- and overexposed pixels
//! - Sharpness: Laplacian variance of the least sharp patch
//! - Background: dominant color-cluster share after seeded k-means
//! - Scale reference: ruler graduations or a coin in frame
//!
//! Results come back as a [`QualityReport`]: feedback in fixed order
//! (lighting, exposure, sharpness, background, scale) plus the raw
//! [`Metrics`]. Analysis is a pure function of the pixels and the
//! [`AnalyzerConfig`]; the same input always yields the same report.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fossil_capture::analyze_file;
//! use std::path::Path;
//!
//! let report = analyze_file(Path::new("specimen.jpg"))?;
//! for item in &report.feedback {
//!     println!("{item}");
//! }
//! println!("min sharpness: {}", report.metrics.min_sharpness);
//! # Ok::<(), fossil_capture::AnalysisError>(())
//! ```

use image::RgbImage;
use std::path::Path;

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod image_loader;
pub mod live;
pub mod preprocess;
pub mod report;

pub use analyzer::QualityAnalyzer;
pub use config::{
    AnalyzerConfig, BackgroundConfig, LightingConfig, RatingConfig, ScaleConfig, SharpnessConfig,
};
pub use detection::{ScaleDetection, ScaleKind};
pub use error::{AnalysisError, Result};
pub use live::{FrameMailbox, LiveAnalyzer, LiveFeedback, LiveOutcome};
pub use preprocess::{CanonicalImage, ImageInput};
pub use report::{Check, FeedbackItem, Metrics, QualityReport, Rating, Ratings, Severity};

/// Analyze an RGB image with the default configuration
///
/// # Errors
///
/// Returns `AnalysisError::InvalidImageError` if the image has zero area.
pub fn analyze(image: &RgbImage) -> Result<QualityReport> {
    QualityAnalyzer::default().analyze(image)
}

/// Analyze an RGB image with explicit thresholds
///
/// # Errors
///
/// Returns `AnalysisError::InvalidParameter` if `config` fails validation,
/// or `InvalidImageError` if the image has zero area.
pub fn analyze_with_config(image: &RgbImage, config: &AnalyzerConfig) -> Result<QualityReport> {
    QualityAnalyzer::new(config.clone())?.analyze(image)
}

/// Analyze encoded image bytes (JPEG, PNG, ...)
pub fn analyze_bytes(bytes: &[u8]) -> Result<QualityReport> {
    QualityAnalyzer::default().analyze_input(ImageInput::Bytes(bytes))
}

/// Analyze a base64 data URI as produced by a browser canvas
pub fn analyze_data_uri(uri: &str) -> Result<QualityReport> {
    QualityAnalyzer::default().analyze_input(ImageInput::DataUri(uri))
}

/// Analyze an image file
pub fn analyze_file(path: &Path) -> Result<QualityReport> {
    let image = image_loader::load_image(path)?;
    QualityAnalyzer::default().analyze_dynamic(&image)
}
