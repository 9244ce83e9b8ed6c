//! Emulator window discovery

use super::error::{HostError, HostResult};
use super::types::{HostPlatform, WindowInfo, WindowRect};
use tokio::time::{Duration, sleep};

/// Finds the emulator window by case-insensitive title substring
#[derive(Debug, Clone)]
pub struct WindowLocator {
    filters: Vec<String>,
    settle: Duration,
}

impl WindowLocator {
    /// `settle` is how long to wait after restoring a minimized window
    pub fn new(filters: &[String], settle: Duration) -> Self {
        Self {
            filters: filters.iter().map(|f| f.to_lowercase()).collect(),
            settle,
        }
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.filters.iter().any(|f| title.contains(f.as_str()))
    }

    fn find<H: HostPlatform>(&self, host: &H) -> HostResult<WindowInfo> {
        host.windows()?
            .into_iter()
            .find(|w| self.matches(&w.title))
            .ok_or_else(|| HostError::WindowNotFound {
                filters: self.filters.clone(),
            })
    }

    /// Current geometry of the emulator window.
    ///
    /// Never cached: the window may move, resize or minimize between calls.
    /// A minimized window is restored and re-queried once after the settle delay.
    pub async fn locate<H: HostPlatform>(&self, host: &H) -> HostResult<WindowRect> {
        let window = self.find(host)?;
        if !window.rect.is_empty() {
            return Ok(window.rect);
        }

        log::warn!(
            "🪟 Window '{}' reports {} (minimized?), restoring",
            window.title,
            window.rect
        );
        host.restore(&window)?;
        sleep(self.settle).await;

        let refreshed = host
            .windows()?
            .into_iter()
            .find(|w| w.id == window.id)
            .map_or_else(|| self.find(host), Ok)?;
        if refreshed.rect.is_empty() {
            return Err(HostError::WindowMinimized {
                title: refreshed.title,
                rect: refreshed.rect,
            });
        }
        log::debug!("🪟 Window '{}' restored to {}", refreshed.title, refreshed.rect);
        Ok(refreshed.rect)
    }
}
