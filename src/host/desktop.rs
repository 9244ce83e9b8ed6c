//! Desktop backend: live window list and screen capture via xcap, clicks via enigo

use super::error::{HostError, HostResult};
use super::types::{HostPlatform, WindowInfo, WindowRect};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use image::RgbImage;
use std::sync::Mutex;
use xcap::{Monitor, Window};

pub struct DesktopHost {
    enigo: Mutex<Enigo>,
}

impl DesktopHost {
    pub fn new() -> HostResult<Self> {
        let enigo = Enigo::new(&Settings::default()).map_err(|e| HostError::InputUnavailable {
            description: e.to_string(),
        })?;
        Ok(Self {
            enigo: Mutex::new(enigo),
        })
    }
}

impl HostPlatform for DesktopHost {
    fn name(&self) -> &str {
        "desktop"
    }

    fn windows(&self) -> HostResult<Vec<WindowInfo>> {
        let windows = Window::all().map_err(|e| HostError::EnumerationFailed {
            description: e.to_string(),
        })?;
        Ok(windows
            .iter()
            .map(|w| {
                // Minimized windows keep stale geometry on some platforms
                let rect = if w.is_minimized() {
                    WindowRect::new(w.x(), w.y(), 0, 0)
                } else {
                    WindowRect::new(w.x(), w.y(), w.width() as i32, w.height() as i32)
                };
                WindowInfo {
                    id: u64::from(w.id()),
                    title: w.title().to_string(),
                    rect,
                }
            })
            .collect())
    }

    fn restore(&self, window: &WindowInfo) -> HostResult<()> {
        restore_native(window)
    }

    fn grab(&self, rect: WindowRect) -> HostResult<RgbImage> {
        let fail = |description: String| HostError::CaptureFailed { rect, description };

        let monitor = Monitor::from_point(rect.left + rect.width / 2, rect.top + rect.height / 2)
            .map_err(|e| fail(e.to_string()))?;
        let shot = monitor.capture_image().map_err(|e| fail(e.to_string()))?;

        let screen = WindowRect::new(
            monitor.x(),
            monitor.y(),
            shot.width() as i32,
            shot.height() as i32,
        );
        let visible = rect
            .intersect(screen)
            .ok_or_else(|| fail("window lies outside its monitor".to_string()))?;

        let region = image::imageops::crop_imm(
            &shot,
            (visible.left - screen.left) as u32,
            (visible.top - screen.top) as u32,
            visible.width as u32,
            visible.height as u32,
        )
        .to_image();
        let region = image::DynamicImage::ImageRgba8(region).to_rgb8();

        // Off-screen parts stay black so frame pixels keep the window's origin
        let mut frame = RgbImage::new(rect.width as u32, rect.height as u32);
        image::imageops::replace(
            &mut frame,
            &region,
            i64::from(visible.left - rect.left),
            i64::from(visible.top - rect.top),
        );
        Ok(frame)
    }

    fn click(&self, x: i32, y: i32) {
        let Ok(mut enigo) = self.enigo.lock() else {
            log::error!("🖱️ Input device lock poisoned, dropping click at ({x}, {y})");
            return;
        };
        let result = enigo
            .move_mouse(x, y, Coordinate::Abs)
            .and_then(|()| enigo.button(Button::Left, Direction::Click));
        if let Err(e) = result {
            log::warn!("🖱️ Click at ({x}, {y}) failed: {e}");
        }
    }
}

#[cfg(target_os = "windows")]
fn restore_native(window: &WindowInfo) -> HostResult<()> {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{SW_RESTORE, ShowWindow};

    let hwnd = HWND(window.id as usize as *mut std::ffi::c_void);
    // SAFETY: the handle comes from the enumeration just performed; ShowWindow
    // tolerates handles of windows that closed in the meantime.
    unsafe {
        let _ = ShowWindow(hwnd, SW_RESTORE);
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn restore_native(window: &WindowInfo) -> HostResult<()> {
    log::warn!(
        "🪟 Restoring windows is not supported here; un-minimize '{}' manually",
        window.title
    );
    Ok(())
}
