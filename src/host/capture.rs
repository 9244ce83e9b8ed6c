//! Frame capture of the emulator window

use super::error::HostResult;
use super::locator::WindowLocator;
use super::types::{HostPlatform, WindowRect};
use image::{GrayImage, RgbImage};

/// One captured emulator frame and the window rectangle it came from.
///
/// Frames are immutable and only valid for the decision cycle that captured them.
#[derive(Debug, Clone)]
pub struct Frame {
    rgb: RgbImage,
    luma: GrayImage,
    rect: WindowRect,
}

impl Frame {
    pub fn new(rgb: RgbImage, rect: WindowRect) -> Self {
        let luma = image::imageops::grayscale(&rgb);
        Self { rgb, luma, rect }
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Grayscale copy used for correlation
    pub fn luma(&self) -> &GrayImage {
        &self.luma
    }

    pub fn rect(&self) -> WindowRect {
        self.rect
    }
}

/// Grabs the current window contents, re-locating the window on every call
#[derive(Debug, Clone)]
pub struct FrameCapture {
    locator: WindowLocator,
}

impl FrameCapture {
    pub fn new(locator: WindowLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &WindowLocator {
        &self.locator
    }

    pub async fn capture<H: HostPlatform>(&self, host: &H) -> HostResult<Frame> {
        let rect = self.locator.locate(host).await?;
        let rgb = host.grab(rect)?;
        log::trace!(
            "📸 Captured {}x{} frame from window {}",
            rgb.width(),
            rgb.height(),
            rect
        );
        Ok(Frame::new(rgb, rect))
    }
}
