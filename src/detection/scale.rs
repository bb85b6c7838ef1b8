//! Combined scale-reference verdict
//!
//! The ruler search runs first. Only when it finds nothing is the coin
//! search run, so a frame containing both reports a ruler. Absence of a
//! reference is a normal outcome, not an error.

use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ScaleConfig;
use crate::detection::{CoinDetector, RulerDetector};

/// Kind of scale reference seen in frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    None,
    Ruler,
    Coin,
}

impl fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScaleKind::None => "none",
            ScaleKind::Ruler => "ruler",
            ScaleKind::Coin => "coin",
        };
        f.write_str(name)
    }
}

/// Presence of a scale reference; `found` is true exactly when `kind` is not `None`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleDetection {
    pub found: bool,
    pub kind: ScaleKind,
}

impl ScaleDetection {
    pub fn none() -> Self {
        Self {
            found: false,
            kind: ScaleKind::None,
        }
    }

    pub fn of(kind: ScaleKind) -> Self {
        Self {
            found: kind != ScaleKind::None,
            kind,
        }
    }
}

/// Ruler-then-coin scale reference detector
pub struct ScaleDetector {
    ruler: RulerDetector,
    coin: CoinDetector,
}

impl Default for ScaleDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaleDetector {
    pub fn new() -> Self {
        Self::with_config(ScaleConfig::default())
    }

    pub fn with_config(config: ScaleConfig) -> Self {
        Self {
            ruler: RulerDetector::with_config(config.clone()),
            coin: CoinDetector::with_config(config),
        }
    }

    pub fn detect(&self, gray: &GrayImage) -> ScaleDetection {
        if self.ruler.detect(gray).is_ruler {
            return ScaleDetection::of(ScaleKind::Ruler);
        }
        if !self.coin.detect(gray).is_empty() {
            return ScaleDetection::of(ScaleKind::Coin);
        }
        ScaleDetection::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn draw_disc(gray: &mut GrayImage, cx: f32, cy: f32, radius: f32, value: u8) {
        let (w, h) = gray.dimensions();
        for y in 0..h {
            for x in 0..w {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    gray.put_pixel(x, y, Luma([value]));
                }
            }
        }
    }

    fn draw_ticks(gray: &mut GrayImage, x_start: u32, count: u32) {
        for i in 0..count {
            let x0 = x_start + i * 20;
            for x in x0..x0 + 3 {
                for y in 40..120 {
                    gray.put_pixel(x, y, Luma([30]));
                }
            }
        }
    }

    #[test]
    fn test_nothing_in_frame() {
        let gray = GrayImage::from_pixel(300, 300, Luma([150]));
        assert_eq!(ScaleDetector::new().detect(&gray), ScaleDetection::none());
    }

    #[test]
    fn test_coin_alone() {
        let mut gray = GrayImage::from_pixel(400, 400, Luma([200]));
        draw_disc(&mut gray, 200.0, 200.0, 40.0, 70);
        let detection = ScaleDetector::new().detect(&gray);
        assert_eq!(detection, ScaleDetection::of(ScaleKind::Coin));
        assert!(detection.found);
    }

    #[test]
    fn test_ruler_wins_over_coin() {
        let mut gray = GrayImage::from_pixel(500, 400, Luma([200]));
        draw_ticks(&mut gray, 20, 16);
        draw_disc(&mut gray, 250.0, 280.0, 40.0, 70);
        let detection = ScaleDetector::new().detect(&gray);
        assert_eq!(detection.kind, ScaleKind::Ruler);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ScaleDetection::of(ScaleKind::Coin)).unwrap();
        assert_eq!(json, r#"{"found":true,"kind":"coin"}"#);
    }
}
