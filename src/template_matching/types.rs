/// Template matching data types
use image::{ImageBuffer, Luma};
use std::fmt;

/// Per-position correlation scores, one pixel per candidate top-left corner
pub type ScoreMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// A location in frame-local pixel coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manhattan (L1) distance to another point
    pub fn manhattan(&self, other: &Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(u32, u32)> for Point {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

/// A single match result
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Top-left corner of the matched window in the frame
    pub top_left: Point,
    /// Centre of the matched window, the point that gets clicked
    pub center: Point,
    /// Correlation score (0.0-1.0)
    pub confidence: f32,
}

impl Match {
    pub fn new(
        top_left: Point,
        template_width: u32,
        template_height: u32,
        confidence: f32,
    ) -> Self {
        Self {
            top_left,
            center: Point::new(
                top_left.x + template_width / 2,
                top_left.y + template_height / 2,
            ),
            confidence,
        }
    }

    /// Whether this match clears the given threshold (inclusive)
    pub fn passes(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {:.1}%", self.center, self.confidence * 100.0)
    }
}
