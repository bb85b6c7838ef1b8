//! Quality report types
//!
//! A [`QualityReport`] is the only output of an analysis: an ordered
//! feedback list (lighting, exposure, sharpness, background, scale), the
//! raw metrics behind it, and the five-level [`Ratings`] of the browser
//! quick check. It is plain data, serializable for whatever UI or HTTP
//! layer displays it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::detection::ScaleDetection;

/// Verdict of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
}

/// The check a feedback item belongs to, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Lighting,
    Exposure,
    Sharpness,
    Background,
    Scale,
}

/// One human-readable verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub check: Check,
    pub severity: Severity,
    pub message: String,
}

impl FeedbackItem {
    pub fn ok(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            severity: Severity::Ok,
            message: message.into(),
        }
    }

    pub fn warning(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for FeedbackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Ok => "ok",
            Severity::Warning => "warning",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Raw measurements behind the feedback
///
/// Percentages are in 0-100, rounded to two decimals. `min_sharpness` is
/// the unrounded Laplacian variance of the least sharp patch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub dark_pct: f64,
    pub bright_pct: f64,
    pub min_sharpness: f64,
    pub dominant_bg_pct: f64,
}

impl Metrics {
    /// Metric name to value mapping
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("dark_pct", self.dark_pct),
            ("bright_pct", self.bright_pct),
            ("min_sharpness", self.min_sharpness),
            ("dominant_bg_pct", self.dominant_bg_pct),
        ])
    }
}

/// Five-level quality grade, worst first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    VeryPoor,
    Poor,
    Intermediate,
    Good,
    VeryGood,
}

impl Rating {
    const LEVELS: [Rating; 5] = [
        Rating::VeryPoor,
        Rating::Poor,
        Rating::Intermediate,
        Rating::Good,
        Rating::VeryGood,
    ];

    /// Level `i` for the first threshold `value` falls below, else very good
    pub fn from_thresholds(value: f64, thresholds: &[f64; 4]) -> Self {
        thresholds
            .iter()
            .position(|&t| value < t)
            .map_or(Rating::VeryGood, |i| Self::LEVELS[i])
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rating::VeryPoor => "Very Poor",
            Rating::Poor => "Poor",
            Rating::Intermediate => "Intermediate",
            Rating::Good => "Good",
            Rating::VeryGood => "Very Good",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole-frame scores of the browser quick check, each with its grade
///
/// Values are rounded to two decimals; grades use the unrounded values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    /// Mean luma, 0-255
    pub mean_luma: f64,
    pub lighting_rating: Rating,
    /// Absolute mean luma difference between the central disc and the border
    pub center_edge_contrast: f64,
    pub contrast_rating: Rating,
    /// Laplacian variance of the middle half of the frame
    pub center_sharpness: f64,
    pub sharpness_rating: Rating,
}

/// Round to two decimals
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a 0.0-1.0 fraction to a percentage rounded to two decimals
pub(crate) fn to_percent(fraction: f64) -> f64 {
    round2((fraction * 100.0).clamp(0.0, 100.0))
}

/// Complete result of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub feedback: Vec<FeedbackItem>,
    pub metrics: Metrics,
    pub scale: ScaleDetection,
    pub ratings: Ratings,
}

impl QualityReport {
    /// True when no check raised a warning
    pub fn is_capture_ready(&self) -> bool {
        self.feedback.iter().all(|item| !item.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &FeedbackItem> {
        self.feedback.iter().filter(|item| item.is_warning())
    }

    pub fn messages(&self) -> Vec<&str> {
        self.feedback.iter().map(|item| item.message.as_str()).collect()
    }

    /// First `count` feedback items as `(severity, message)` for a video overlay
    pub fn overlay_lines(&self, count: usize) -> Vec<(Severity, &str)> {
        self.feedback
            .iter()
            .take(count)
            .map(|item| (item.severity, item.message.as_str()))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::ScaleKind;

    fn sample_report() -> QualityReport {
        QualityReport {
            feedback: vec![
                FeedbackItem::ok(Check::Lighting, "Lighting is adequate."),
                FeedbackItem::ok(Check::Exposure, "No major overexposure."),
                FeedbackItem::warning(Check::Sharpness, "Some regions are blurry."),
                FeedbackItem::ok(Check::Background, "Background appears uniform."),
                FeedbackItem::warning(Check::Scale, "No scale reference detected."),
            ],
            metrics: Metrics {
                dark_pct: 1.25,
                bright_pct: 0.0,
                min_sharpness: 12.5,
                dominant_bg_pct: 91.3,
            },
            scale: ScaleDetection::of(ScaleKind::None),
            ratings: Ratings {
                mean_luma: 131.5,
                lighting_rating: Rating::Good,
                center_edge_contrast: 42.0,
                contrast_rating: Rating::Good,
                center_sharpness: 12.5,
                sharpness_rating: Rating::VeryPoor,
            },
        }
    }

    #[test]
    fn test_rating_levels() {
        let lighting = [60.0, 90.0, 120.0, 180.0];
        assert_eq!(Rating::from_thresholds(0.0, &lighting), Rating::VeryPoor);
        assert_eq!(Rating::from_thresholds(59.99, &lighting), Rating::VeryPoor);
        assert_eq!(Rating::from_thresholds(60.0, &lighting), Rating::Poor);
        assert_eq!(Rating::from_thresholds(119.0, &lighting), Rating::Intermediate);
        assert_eq!(Rating::from_thresholds(179.9, &lighting), Rating::Good);
        assert_eq!(Rating::from_thresholds(180.0, &lighting), Rating::VeryGood);
        assert_eq!(Rating::from_thresholds(255.0, &lighting), Rating::VeryGood);
    }

    #[test]
    fn test_rating_order_and_labels() {
        assert!(Rating::VeryPoor < Rating::Poor);
        assert!(Rating::Good < Rating::VeryGood);
        assert_eq!(Rating::VeryPoor.to_string(), "Very Poor");
        assert_eq!(Rating::Intermediate.to_string(), "Intermediate");
        assert_eq!(
            serde_json::to_string(&Rating::VeryGood).unwrap(),
            r#""very_good""#
        );
    }

    #[test]
    fn test_percent_rounding_and_bounds() {
        assert_eq!(to_percent(0.123456), 12.35);
        assert_eq!(to_percent(1.0), 100.0);
        assert_eq!(to_percent(0.0), 0.0);
        assert_eq!(to_percent(1.2), 100.0);
    }

    #[test]
    fn test_warning_helpers() {
        let report = sample_report();
        assert!(!report.is_capture_ready());
        assert_eq!(report.warnings().count(), 2);
        assert_eq!(report.overlay_lines(3).len(), 3);
        assert_eq!(report.overlay_lines(3)[2].0, Severity::Warning);
    }

    #[test]
    fn test_metrics_map_names() {
        let map = sample_report().metrics.as_map();
        assert_eq!(
            map.keys().copied().collect::<Vec<_>>(),
            vec!["bright_pct", "dark_pct", "dominant_bg_pct", "min_sharpness"]
        );
        assert_eq!(map["dominant_bg_pct"], 91.3);
    }

    #[test]
    fn test_report_serialization() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""severity":"warning""#));
        let back: QualityReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }

    #[test]
    fn test_display_tags_severity() {
        let item = FeedbackItem::warning(Check::Lighting, "too dark");
        assert_eq!(item.to_string(), "[warning] too dark");
    }
}
