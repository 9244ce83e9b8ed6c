//! Replay backend: serves saved screenshots as the emulator window and only logs clicks

use super::error::{HostError, HostResult};
use super::types::{HostPlatform, WindowInfo, WindowRect};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct ReplayHost {
    frames: Vec<(PathBuf, RgbImage)>,
    cursor: AtomicUsize,
}

impl ReplayHost {
    /// Load every PNG/JPEG in `dir`, ordered by file name
    pub fn open(dir: &Path) -> HostResult<Self> {
        let fail = |description: String| HostError::ReplayLoadFailed {
            path: dir.to_path_buf(),
            description,
        };

        let entries = std::fs::read_dir(dir).map_err(|e| fail(e.to_string()))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            match image::open(&path) {
                Ok(img) => frames.push((path, img.to_rgb8())),
                Err(e) => log::warn!("⚠️ Skipping replay frame {}: {}", path.display(), e),
            }
        }
        if frames.is_empty() {
            return Err(fail("no readable PNG/JPEG frames".to_string()));
        }

        log::info!("🎞️ Replay backend loaded {} frames from {}", frames.len(), dir.display());
        Ok(Self {
            frames,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn current(&self) -> &(PathBuf, RgbImage) {
        &self.frames[self.cursor.load(Ordering::Relaxed) % self.frames.len()]
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        .unwrap_or(false)
}

impl HostPlatform for ReplayHost {
    fn name(&self) -> &str {
        "replay"
    }

    fn windows(&self) -> HostResult<Vec<WindowInfo>> {
        let (path, img) = self.current();
        let file = path.file_name().and_then(|f| f.to_str()).unwrap_or("frame");
        Ok(vec![WindowInfo {
            id: 1,
            title: format!("MuMu replay [{file}]"),
            rect: WindowRect::new(0, 0, img.width() as i32, img.height() as i32),
        }])
    }

    fn restore(&self, _window: &WindowInfo) -> HostResult<()> {
        Ok(())
    }

    fn grab(&self, rect: WindowRect) -> HostResult<RgbImage> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        let (path, img) = &self.frames[index];
        log::debug!("🎞️ Replaying frame {} ({})", index, path.display());
        if rect.is_empty() {
            return Err(HostError::CaptureFailed {
                rect,
                description: "empty capture rectangle".to_string(),
            });
        }
        let width = (rect.width as u32).min(img.width());
        let height = (rect.height as u32).min(img.height());
        Ok(image::imageops::crop_imm(img, 0, 0, width, height).to_image())
    }

    fn click(&self, x: i32, y: i32) {
        log::info!("🖱️ [replay] click at ({x}, {y})");
    }
}
