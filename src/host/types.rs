// Core host types and traits
use super::error::HostResult;
use crate::template_matching::Point;
use image::RgbImage;
use std::fmt;

/// Screen-space rectangle of the emulator window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowRect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Minimized windows report a zero or negative area
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Overlap with `bounds`, or `None` when the two do not intersect
    pub fn intersect(&self, bounds: WindowRect) -> Option<WindowRect> {
        let left = self.left.max(bounds.left);
        let top = self.top.max(bounds.top);
        let right = (self.left + self.width).min(bounds.left + bounds.width);
        let bottom = (self.top + self.height).min(bounds.top + bounds.height);
        let overlap = WindowRect::new(left, top, right - left, bottom - top);
        (!overlap.is_empty()).then_some(overlap)
    }

    /// Screen coordinates of a frame-local point
    pub fn to_screen(&self, point: Point) -> (i32, i32) {
        (self.left + point.x as i32, self.top + point.y as i32)
    }

    /// Screen coordinates of a pixel offset from the window's top-left corner
    pub fn offset(&self, dx: i32, dy: i32) -> (i32, i32) {
        (self.left + dx, self.top + dy)
    }

    /// Screen coordinates of a point given as fractions of the window size
    pub fn fraction(&self, fx: f32, fy: f32) -> (i32, i32) {
        (
            self.left + (self.width as f32 * fx) as i32,
            self.top + (self.height as f32 * fy) as i32,
        )
    }
}

impl fmt::Display for WindowRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.left, self.top
        )
    }
}

/// A top-level window as reported by the host
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    pub id: u64,
    pub title: String,
    pub rect: WindowRect,
}

// Trait defining the host primitives the automation needs (desktop or replay)
pub trait HostPlatform: Send + Sync {
    /// Short backend name for log lines
    fn name(&self) -> &str;

    /// Enumerate top-level windows with their titles and screen rectangles
    fn windows(&self) -> HostResult<Vec<WindowInfo>>;

    /// Bring a minimized window back so it reports real geometry
    fn restore(&self, window: &WindowInfo) -> HostResult<()>;

    /// Capture the pixels of a screen rectangle
    fn grab(&self, rect: WindowRect) -> HostResult<RgbImage>;

    /// Fire-and-forget left click at absolute screen coordinates
    fn click(&self, x: i32, y: i32);
}
