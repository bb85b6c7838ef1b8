//! Ruler detection from the orientation histogram of straight edge segments
//!
//! Graduation marks on a ruler or scale bar produce many straight edges
//! sharing one orientation. Edges are extracted with Canny and candidate
//! lines found with a Hough transform. A Hough line is unbounded and
//! collects votes from every collinear edge pixel, so each candidate is
//! walked across the edge map and kept only when it carries one contiguous
//! run of at least `min_line_length` pixels. Kept segments are binned by
//! orientation; bins are centered on multiples of the bin width and wrap
//! at ±90°, so near-vertical segments on either side of vertical share a
//! bin. A ruler is declared when any single bin holds more than
//! `min_bin_count` segments.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use tracing::debug;

use crate::config::ScaleConfig;
use crate::detection::working_gray;

/// Pixels on either side of the walked line, along its normal, that still
/// count as lying on it
const NORMAL_TOLERANCE: i32 = 1;

/// What the line search saw
#[derive(Debug, Clone, PartialEq)]
pub struct RulerEvidence {
    /// Segment count per orientation bin; bin `k` is centered on
    /// `-90° + k * 180° / bins`
    pub histogram: Vec<usize>,
    /// Hough candidates before segment verification
    pub candidate_count: usize,
    /// Candidates carrying a long enough contiguous edge run
    pub line_count: usize,
    /// Index of the fullest bin
    pub peak_bin: usize,
    /// Segments in the fullest bin
    pub peak_count: usize,
    pub is_ruler: bool,
}

impl RulerEvidence {
    /// Center orientation in degrees of the peak bin, in [-90, 90)
    pub fn peak_orientation(&self) -> f32 {
        let width = 180.0 / self.histogram.len().max(1) as f32;
        -90.0 + self.peak_bin as f32 * width
    }
}

/// Straight-edge orientation detector
pub struct RulerDetector {
    config: ScaleConfig,
}

impl Default for RulerDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RulerDetector {
    pub fn new() -> Self {
        Self {
            config: ScaleConfig::default(),
        }
    }

    pub fn with_config(config: ScaleConfig) -> Self {
        Self { config }
    }

    /// Search a grayscale image for ruler-like parallel edges
    pub fn detect(&self, gray: &GrayImage) -> RulerEvidence {
        let working = working_gray(gray, self.config.working_max_side);

        // Step 1: Edge map
        let edges = canny(&working, self.config.canny_low, self.config.canny_high);

        // Step 2: Candidate lines with enough collinear edge pixels
        let candidates = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold: self.config.min_line_length,
                suppression_radius: self.config.suppression_radius,
            },
        );
        let candidates = merge_wrapped(candidates, self.config.suppression_radius);

        // Step 3: Keep lines backed by one contiguous segment
        let segments: Vec<PolarLine> = candidates
            .iter()
            .copied()
            .filter(|line| {
                longest_run(&edges, line, self.config.max_line_gap) >= self.config.min_line_length
            })
            .collect();

        // Step 4: Orientation histogram
        let histogram = self.orientation_histogram(&segments);
        let (peak_bin, peak_count) = histogram
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0), |best, (bin, count)| if count > best.1 { (bin, count) } else { best });

        let evidence = RulerEvidence {
            candidate_count: candidates.len(),
            line_count: segments.len(),
            is_ruler: peak_count > self.config.min_bin_count,
            histogram,
            peak_bin,
            peak_count,
        };

        debug!(
            candidates = evidence.candidate_count,
            segments = evidence.line_count,
            peak_orientation = evidence.peak_orientation(),
            peak_count = evidence.peak_count,
            is_ruler = evidence.is_ruler,
            "ruler search finished"
        );
        evidence
    }

    /// Bin lines by orientation, wrapping at ±90°
    pub fn orientation_histogram(&self, lines: &[PolarLine]) -> Vec<usize> {
        let bins = self.config.angle_bins.max(1);
        let mut histogram = vec![0usize; bins];
        for line in lines {
            let bin = orientation_bin(line_orientation(line), bins);
            histogram[bin] += 1;
        }
        histogram
    }
}

/// Orientation of a Hough line in degrees, in [-90, 90)
///
/// The Hough angle measures the line normal; the line itself runs 90° away.
pub fn line_orientation(line: &PolarLine) -> f32 {
    (line.angle_in_degrees % 180) as f32 - 90.0
}

/// Circular bin index: bin `k` covers `[-90 + (k - 0.5) w, -90 + (k + 0.5) w)`
fn orientation_bin(orientation: f32, bins: usize) -> usize {
    let width = 180.0 / bins as f32;
    let idx = ((orientation + 90.0 + width / 2.0) / width).floor();
    (idx.max(0.0) as usize) % bins
}

/// Drop lines near 180° that duplicate a line near 0°
///
/// The accumulator spans normal angles [0°, 180°) without wrapping, so one
/// near-vertical edge can survive suppression at both ends. The line
/// `(r, θ)` equals `(-r, θ - 180°)`, which is how the two are matched.
fn merge_wrapped(lines: Vec<PolarLine>, radius: u32) -> Vec<PolarLine> {
    let radius = radius.max(1);
    let (low, rest): (Vec<PolarLine>, Vec<PolarLine>) =
        lines.into_iter().partition(|l| l.angle_in_degrees < radius);

    let mut merged = low.clone();
    for line in rest {
        let wrapped = line.angle_in_degrees + radius > 180;
        let duplicate = wrapped
            && low.iter().any(|other| {
                let angle_gap = other.angle_in_degrees + 180 - line.angle_in_degrees;
                angle_gap <= radius && (other.r + line.r).abs() <= radius as f32
            });
        if !duplicate {
            merged.push(line);
        }
    }
    merged
}

/// Length in pixels of the longest run of edge pixels along `line`
///
/// Up to `max_gap` consecutive empty samples are bridged. The Hough radius
/// is truncated to whole pixels, so each sample also checks
/// `NORMAL_TOLERANCE` pixels to either side along the normal.
pub fn longest_run(edges: &GrayImage, line: &PolarLine, max_gap: u32) -> u32 {
    let (width, height) = edges.dimensions();
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    let (base_x, base_y) = (line.r * cos, line.r * sin);

    let on_edge = |px: f32, py: f32| {
        (-NORMAL_TOLERANCE..=NORMAL_TOLERANCE).any(|k| {
            let x = (px + k as f32 * cos).round();
            let y = (py + k as f32 * sin).round();
            x >= 0.0
                && y >= 0.0
                && (x as u32) < width
                && (y as u32) < height
                && edges.get_pixel(x as u32, y as u32).0[0] > 0
        })
    };

    let reach = 2 * (width as i64 + height as i64);
    let mut best = 0i64;
    let mut run_start: Option<i64> = None;
    let mut misses = 0u32;
    for t in -reach..=reach {
        let tf = t as f32;
        if on_edge(base_x - tf * sin, base_y + tf * cos) {
            let start = *run_start.get_or_insert(t);
            misses = 0;
            best = best.max(t - start + 1);
        } else if run_start.is_some() {
            misses += 1;
            if misses > max_gap {
                run_start = None;
                misses = 0;
            }
        }
    }
    best as u32
}
