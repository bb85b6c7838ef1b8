//! Reference thresholds and processing constants for capture-quality analysis
//!
//! The capture prototypes this crate serves were tuned independently, so
//! two families of values exist: one for post-capture review of a still
//! photo and one for the stricter real-time live-view check. Both are kept
//! here so presets in [`crate::config`] can be built from named values.

/// Luma weights used to derive grayscale from RGB (ITU-R BT.601)
pub mod luma {
    pub const RED_WEIGHT: f32 = 0.299;
    pub const GREEN_WEIGHT: f32 = 0.587;
    pub const BLUE_WEIGHT: f32 = 0.114;
}

/// Lighting thresholds (luma values are 0-255, limits are fractions 0.0-1.0)
pub mod lighting {
    /// Pixels with luma strictly below this count as underexposed
    pub const DARK_THRESHOLD: u8 = 50;

    /// Post-capture: pixels with luma strictly above this count as overexposed
    pub const POST_CAPTURE_BRIGHT_THRESHOLD: u8 = 220;

    /// Real-time: pixels with luma strictly above this count as overexposed
    pub const REAL_TIME_BRIGHT_THRESHOLD: u8 = 240;

    /// Post-capture fraction of dark pixels tolerated before warning
    pub const POST_CAPTURE_DARK_LIMIT: f64 = 0.20;

    /// Real-time fraction of dark pixels tolerated before warning
    pub const REAL_TIME_DARK_LIMIT: f64 = 0.15;

    /// Post-capture fraction of bright pixels tolerated before warning
    pub const POST_CAPTURE_BRIGHT_LIMIT: f64 = 0.20;

    /// Real-time fraction of bright pixels tolerated before warning
    pub const REAL_TIME_BRIGHT_LIMIT: f64 = 0.10;
}

/// Sharpness parameters
pub mod sharpness {
    /// Post-capture patch edge length in pixels
    pub const POST_CAPTURE_PATCH_SIZE: u32 = 100;

    /// Real-time patch edge length in pixels
    pub const REAL_TIME_PATCH_SIZE: u32 = 120;

    /// Post-capture minimum Laplacian variance for a patch to count as sharp
    pub const POST_CAPTURE_MIN_SHARPNESS: f64 = 100.0;

    /// Real-time minimum Laplacian variance
    pub const REAL_TIME_MIN_SHARPNESS: f64 = 120.0;
}

/// Background clustering parameters
pub mod background {
    /// Number of color clusters
    pub const CLUSTERS: usize = 3;

    /// Independent k-means initialisations; the lowest-inertia run wins
    pub const RESTARTS: usize = 10;

    /// Lloyd iteration cap per run
    pub const MAX_ITERATIONS: usize = 300;

    /// Center shift (squared, in 8-bit RGB units) below which a run has converged
    pub const CONVERGENCE_TOLERANCE: f64 = 1e-4;

    /// Post-capture working resolution (square)
    pub const POST_CAPTURE_WORKING_SIZE: u32 = 100;

    /// Real-time working resolution (square)
    pub const REAL_TIME_WORKING_SIZE: u32 = 150;

    /// Post-capture clustering seed
    pub const POST_CAPTURE_SEED: u64 = 42;

    /// Real-time clustering seed
    pub const REAL_TIME_SEED: u64 = 0;

    /// Dominant-cluster share below which the background counts as cluttered
    pub const MIN_DOMINANT_SHARE: f64 = 0.70;
}

/// Scale-reference detection parameters
pub mod scale {
    /// Longest side of the working image used for line and circle search
    pub const WORKING_MAX_SIDE: u32 = 800;

    /// Canny hysteresis thresholds
    pub const CANNY_LOW_THRESHOLD: f32 = 50.0;
    pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;

    /// Upper bound accepted for `working_max_side`
    pub const MAX_WORKING_SIDE: u32 = 8192;

    /// Minimum length in pixels of a contiguous edge run along a line; also
    /// the Hough vote threshold for candidate lines
    pub const MIN_LINE_LENGTH: u32 = 40;

    /// Missing edge samples tolerated inside one run
    pub const MAX_LINE_GAP: u32 = 1;

    /// Non-maximum suppression radius in the line accumulator
    pub const LINE_SUPPRESSION_RADIUS: u32 = 8;

    /// Orientation histogram bins over [-90°, 90°)
    pub const ANGLE_BINS: usize = 18;

    /// A bin holding more lines than this marks a ruler
    pub const MIN_BIN_COUNT: usize = 10;

    /// Gaussian blur applied before circle search
    pub const CIRCLE_BLUR_SIGMA: f32 = 2.0;

    /// Circle radius search range in working pixels
    pub const MIN_RADIUS: u32 = 10;
    pub const MAX_RADIUS: u32 = 100;

    /// Center accumulator votes required for a circle candidate
    pub const ACCUMULATOR_THRESHOLD: u32 = 30;

    /// Minimum distance between two reported circle centers
    pub const MIN_CENTER_DISTANCE: f32 = 20.0;

    /// Fraction of the circumference that must be backed by edge pixels
    pub const MIN_EDGE_SUPPORT: f32 = 0.5;
}

/// Five-level ratings of the browser quick check
///
/// A value below `thresholds[i]` rates at level `i` (very poor = 0); a
/// value at or above the last threshold rates very good.
pub mod rating {
    /// Mean luma thresholds
    pub const LIGHTING_MEAN_THRESHOLDS: [f64; 4] = [60.0, 90.0, 120.0, 180.0];

    /// Center-region Laplacian variance thresholds
    pub const SHARPNESS_THRESHOLDS: [f64; 4] = [40.0, 80.0, 110.0, 150.0];

    /// Center-to-edge mean luma difference thresholds
    pub const CONTRAST_THRESHOLDS: [f64; 4] = [15.0, 30.0, 40.0, 60.0];

    /// Radius of the central disc where the specimen is expected, as a
    /// fraction of the shorter image side
    pub const CENTER_RADIUS_FRACTION: f64 = 0.3;

    /// Pixels farther than this multiple of the center radius count as edge
    pub const EDGE_RADIUS_FACTOR: f64 = 1.5;

    /// Center window for the quick sharpness score: the middle half of
    /// each axis
    pub const CENTER_WINDOW_START: f64 = 0.25;
    pub const CENTER_WINDOW_END: f64 = 0.75;
}

/// Live-view loop timing
pub mod live {
    use std::time::Duration;

    /// Default spacing between analyses of the latest frame
    pub const ANALYSIS_INTERVAL: Duration = Duration::from_millis(500);
}
