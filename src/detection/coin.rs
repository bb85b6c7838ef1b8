//! Coin detection with a gradient-directed circular Hough transform
//!
//! Algorithm:
//! 1. Blur the working grayscale image and extract Canny edges
//! 2. Every edge pixel votes for candidate centers along its gradient
//!    direction (both senses) at each radius in `[min_radius, max_radius]`
//! 3. Accumulator peaks, scored over a 3×3 neighbourhood, become candidate
//!    centers, strongest first, at least `min_center_distance` apart
//! 4. Each candidate's radius is the distance most edge pixels agree on;
//!    it is accepted when those pixels cover `min_edge_support` of the
//!    circumference

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use std::f32::consts::PI;
use tracing::debug;

use crate::config::ScaleConfig;
use crate::detection::working_gray;

/// Upper bound on candidate centers verified per image
const MAX_CANDIDATES: usize = 16;

/// A circle found in working-image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Fraction of the circumference backed by edge pixels
    pub support: f32,
}

/// Circular object detector
pub struct CoinDetector {
    config: ScaleConfig,
}

impl Default for CoinDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinDetector {
    pub fn new() -> Self {
        Self {
            config: ScaleConfig::default(),
        }
    }

    pub fn with_config(config: ScaleConfig) -> Self {
        Self { config }
    }

    /// Find circles whose radius lies in the configured range
    pub fn detect(&self, gray: &GrayImage) -> Vec<Circle> {
        let working = working_gray(gray, self.config.working_max_side);
        let (width, height) = working.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        // Step 1: Smooth and extract edges
        let blurred: GrayImage = gaussian_blur_f32(&*working, self.config.blur_sigma);
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);
        let gx = horizontal_sobel(&blurred);
        let gy = vertical_sobel(&blurred);

        let edge_points: Vec<(u32, u32)> = edges
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] > 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        if edge_points.is_empty() {
            debug!("coin search found no edges");
            return Vec::new();
        }

        // Step 2: Center voting
        let accumulator = self.vote_centers(&edge_points, &gx, &gy, width, height);

        // Step 3: Candidate centers
        let candidates = self.candidate_centers(&accumulator, width, height);

        // Step 4: Radius estimation and verification
        let circles: Vec<Circle> = candidates
            .into_iter()
            .filter_map(|(cx, cy)| self.verify(cx, cy, &edge_points))
            .collect();

        debug!(
            edges = edge_points.len(),
            circles = circles.len(),
            "coin search finished"
        );
        circles
    }

    fn vote_centers(
        &self,
        edge_points: &[(u32, u32)],
        gx: &ImageBuffer<Luma<i16>, Vec<i16>>,
        gy: &ImageBuffer<Luma<i16>, Vec<i16>>,
        width: u32,
        height: u32,
    ) -> Vec<u32> {
        let mut accumulator = vec![0u32; width as usize * height as usize];
        let (w, h) = (width as f32, height as f32);

        for &(x, y) in edge_points {
            let dx = gx.get_pixel(x, y).0[0] as f32;
            let dy = gy.get_pixel(x, y).0[0] as f32;
            let magnitude = (dx * dx + dy * dy).sqrt();
            if magnitude <= f32::EPSILON {
                continue;
            }
            let (ux, uy) = (dx / magnitude, dy / magnitude);

            for radius in self.config.min_radius..=self.config.max_radius {
                let r = radius as f32;
                for sign in [1.0f32, -1.0] {
                    let cx = (x as f32 + sign * r * ux).round();
                    let cy = (y as f32 + sign * r * uy).round();
                    if cx < 0.0 || cy < 0.0 || cx >= w || cy >= h {
                        continue;
                    }
                    accumulator[cy as usize * width as usize + cx as usize] += 1;
                }
            }
        }

        accumulator
    }

    /// Peaks of the 3×3-summed accumulator, strongest first
    fn candidate_centers(&self, accumulator: &[u32], width: u32, height: u32) -> Vec<(u32, u32)> {
        let (w, h) = (width as i64, height as i64);
        let at = |x: i64, y: i64| -> u32 {
            if x < 0 || y < 0 || x >= w || y >= h {
                0
            } else {
                accumulator[(y * w + x) as usize]
            }
        };

        let mut scored = Vec::new();
        for y in 0..h {
            for x in 0..w {
                if at(x, y) == 0 {
                    continue;
                }
                let mut score = 0;
                for ny in y - 1..=y + 1 {
                    for nx in x - 1..=x + 1 {
                        score += at(nx, ny);
                    }
                }
                if score >= self.config.accumulator_threshold {
                    scored.push((score, x as u32, y as u32));
                }
            }
        }

        // strongest first; position breaks ties so the order is total
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.2.cmp(&b.2)).then(a.1.cmp(&b.1)));

        let min_dist_sq = self.config.min_center_distance * self.config.min_center_distance;
        let mut centers: Vec<(u32, u32)> = Vec::new();
        for (_, x, y) in scored {
            let far_enough = centers.iter().all(|&(cx, cy)| {
                let dx = cx as f32 - x as f32;
                let dy = cy as f32 - y as f32;
                dx * dx + dy * dy >= min_dist_sq
            });
            if far_enough {
                centers.push((x, y));
                if centers.len() >= MAX_CANDIDATES {
                    break;
                }
            }
        }
        centers
    }

    /// Pick the best-supported radius around a candidate center
    fn verify(&self, cx: u32, cy: u32, edge_points: &[(u32, u32)]) -> Option<Circle> {
        let min_r = self.config.min_radius.max(1) as usize;
        let max_r = (self.config.max_radius as usize).max(min_r);
        let mut histogram = vec![0u32; max_r + 2];

        for &(x, y) in edge_points {
            let dx = x as f32 - cx as f32;
            let dy = y as f32 - cy as f32;
            let distance = (dx * dx + dy * dy).sqrt().round() as usize;
            if distance + 1 >= min_r && distance <= max_r + 1 {
                histogram[distance] += 1;
            }
        }

        let mut best: Option<Circle> = None;
        for radius in min_r..=max_r {
            let window = histogram[radius - 1] + histogram[radius] + histogram[radius + 1];
            let support = window as f32 / (2.0 * PI * radius as f32);
            if support >= self.config.min_edge_support
                && best.map_or(true, |b| support > b.support)
            {
                best = Some(Circle {
                    x: cx as f32,
                    y: cy as f32,
                    radius: radius as f32,
                    support,
                });
            }
        }
        best
    }
}
