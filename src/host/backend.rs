use super::error::HostResult;
#[cfg(feature = "desktop")]
use super::desktop::DesktopHost;
use super::replay::ReplayHost;
use super::types::{HostPlatform, WindowInfo, WindowRect};
use image::RgbImage;
use std::path::Path;

pub enum HostBackend {
    Replay(ReplayHost),
    #[cfg(feature = "desktop")]
    Desktop(DesktopHost),
}

impl HostBackend {
    pub fn replay(dir: &Path) -> HostResult<Self> {
        Ok(HostBackend::Replay(ReplayHost::open(dir)?))
    }

    #[cfg(feature = "desktop")]
    pub fn desktop() -> HostResult<Self> {
        Ok(HostBackend::Desktop(DesktopHost::new()?))
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, HostBackend::Replay(_))
    }
}

impl HostPlatform for HostBackend {
    fn name(&self) -> &str {
        match self {
            HostBackend::Replay(r) => r.name(),
            #[cfg(feature = "desktop")]
            HostBackend::Desktop(d) => d.name(),
        }
    }

    fn windows(&self) -> HostResult<Vec<WindowInfo>> {
        match self {
            HostBackend::Replay(r) => r.windows(),
            #[cfg(feature = "desktop")]
            HostBackend::Desktop(d) => d.windows(),
        }
    }

    fn restore(&self, window: &WindowInfo) -> HostResult<()> {
        match self {
            HostBackend::Replay(r) => r.restore(window),
            #[cfg(feature = "desktop")]
            HostBackend::Desktop(d) => d.restore(window),
        }
    }

    fn grab(&self, rect: WindowRect) -> HostResult<RgbImage> {
        match self {
            HostBackend::Replay(r) => r.grab(rect),
            #[cfg(feature = "desktop")]
            HostBackend::Desktop(d) => d.grab(rect),
        }
    }

    fn click(&self, x: i32, y: i32) {
        match self {
            HostBackend::Replay(r) => r.click(x, y),
            #[cfg(feature = "desktop")]
            HostBackend::Desktop(d) => d.click(x, y),
        }
    }
}
