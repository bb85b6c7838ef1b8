//! Photometric analyzers: exposure, contrast, focus and background uniformity
//!
//! Each analyzer is a read-only function of the canonical image and
//! returns its own measurement; none holds state between calls.

pub mod background;
pub mod cluster;
pub mod contrast;
pub mod lighting;
pub mod sharpness;

pub use background::{BackgroundAnalyzer, BackgroundMeasurement};
pub use contrast::{ContrastAnalyzer, ContrastMeasurement};
pub use lighting::{LightingAnalyzer, LightingMeasurement};
pub use sharpness::{SharpnessAnalyzer, SharpnessMeasurement};
