// Primitives shared by the run controller and the shop flow: capture, detect, click, wait
use super::config::{BotConfig, TimingConfig};
use super::control::ControlPlane;
use super::error::RunResult;
use super::match_image::{Detector, Token};
use crate::host::{Frame, FrameCapture, HostPlatform, WindowLocator, WindowRect};
use crate::template_matching::Point;
use std::sync::Arc;
use tokio::time::{Duration, Instant, sleep};

/// Everything one run attempt needs, threaded by reference through every
/// component that can suspend.
pub struct Session<H: HostPlatform> {
    host: Arc<H>,
    capture: FrameCapture,
    detector: Detector,
    control: ControlPlane,
    config: BotConfig,
}

impl<H: HostPlatform> Session<H> {
    pub fn new(host: Arc<H>, detector: Detector, config: BotConfig, control: ControlPlane) -> Self {
        let locator = WindowLocator::new(
            &config.window_filters,
            TimingConfig::ms(config.timing.restore_settle_ms),
        );
        Self {
            host,
            capture: FrameCapture::new(locator),
            detector,
            control,
            config,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn control(&self) -> &ControlPlane {
        &self.control
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.config.timing
    }

    pub async fn checkpoint(&self) -> RunResult<()> {
        self.control.checkpoint().await
    }

    pub async fn sleep_ms(&self, ms: u64) {
        if ms > 0 {
            sleep(Duration::from_millis(ms)).await;
        }
    }

    /// Fresh window geometry, never cached across waits
    pub async fn window_rect(&self) -> RunResult<WindowRect> {
        self.checkpoint().await?;
        Ok(self.capture.locator().locate(&*self.host).await?)
    }

    pub async fn capture(&self) -> RunResult<Frame> {
        self.checkpoint().await?;
        Ok(self.capture.capture(&*self.host).await?)
    }

    pub fn find(&self, frame: &Frame, token: Token) -> Option<Point> {
        self.detector.find(frame, token)
    }

    /// Capture once and look for `token`
    pub async fn look_for(&self, token: Token) -> RunResult<Option<(WindowRect, Point)>> {
        let frame = self.capture().await?;
        Ok(self.find(&frame, token).map(|p| (frame.rect(), p)))
    }

    pub async fn click_screen(&self, x: i32, y: i32) -> RunResult<()> {
        self.checkpoint().await?;
        log::trace!("🖱️ Click ({x}, {y})");
        self.host.click(x, y);
        Ok(())
    }

    /// Click a frame-local point of the window the frame was captured from
    pub async fn click_in_frame(&self, rect: WindowRect, point: Point) -> RunResult<()> {
        let (x, y) = rect.to_screen(point);
        self.click_screen(x, y).await
    }

    pub async fn click_offset(&self, rect: WindowRect, dx: i32, dy: i32) -> RunResult<()> {
        let (x, y) = rect.offset(dx, dy);
        self.click_screen(x, y).await
    }

    pub async fn click_fraction(&self, rect: WindowRect, fx: f32, fy: f32) -> RunResult<()> {
        let (x, y) = rect.fraction(fx, fy);
        self.click_screen(x, y).await
    }

    /// Click the empty strip near the window's left edge
    pub async fn click_blank(&self, rect: WindowRect) -> RunResult<()> {
        self.click_offset(rect, self.config.layout.blank_x_offset, rect.height / 2)
            .await
    }

    /// Fast-forward idle turns by hammering the blank strip
    pub async fn burst_click(&self) -> RunResult<()> {
        let rect = self.window_rect().await?;
        let timing = self.timing();
        let deadline = Instant::now() + TimingConfig::ms(timing.burst_duration_ms);
        while Instant::now() < deadline {
            self.click_blank(rect).await?;
            self.sleep_ms(timing.burst_interval_ms).await;
        }
        Ok(())
    }

    /// Dismiss item-detail popups after a purchase
    pub async fn clear_overlay(&self, rect: WindowRect) -> RunResult<()> {
        let timing = self.timing();
        for _ in 0..timing.overlay_clicks {
            self.click_blank(rect).await?;
            self.sleep_ms(timing.overlay_interval_ms).await;
        }
        Ok(())
    }

    /// Poll for `token` until it shows up or `timeout_ms` runs out
    pub async fn wait_for(
        &self,
        token: Token,
        timeout_ms: u64,
        poll_ms: u64,
    ) -> RunResult<Option<(WindowRect, Point)>> {
        let deadline = Instant::now() + TimingConfig::ms(timeout_ms);
        loop {
            if let Some(found) = self.look_for(token).await? {
                return Ok(Some(found));
            }
            if Instant::now() + TimingConfig::ms(poll_ms) > deadline {
                return Ok(None);
            }
            self.sleep_ms(poll_ms).await;
        }
    }

    /// Wait for a button and click it.
    ///
    /// Fails fast when the template is not loaded. A timeout is not an error:
    /// the caller proceeds as if the screen had already moved past the button.
    /// Entry-sequence buttons stop waiting once the skip hotkey was pressed.
    pub async fn wait_and_click(&self, token: Token, timeout_ms: u64) -> RunResult<bool> {
        self.detector.library().require(token)?;
        let poll_ms = self.timing().wait_poll_ms;
        let deadline = Instant::now() + TimingConfig::ms(timeout_ms);
        loop {
            self.checkpoint().await?;
            if token.is_initial() && self.control.skip_requested() {
                log::info!("⏭️ Skipped waiting for {token}");
                return Ok(false);
            }
            if let Some((rect, point)) = self.look_for(token).await? {
                log::info!("👆 Clicking {token} at {point}");
                self.click_in_frame(rect, point).await?;
                return Ok(true);
            }
            if Instant::now() >= deadline {
                log::warn!("⏰ {token} not found within {:.0}s", timeout_ms as f64 / 1000.0);
                return Ok(false);
            }
            self.sleep_ms(poll_ms).await;
        }
    }

    /// Capture once and click `token` if it is visible
    pub async fn probe_and_click(&self, token: Token) -> RunResult<bool> {
        match self.look_for(token).await? {
            Some((rect, point)) => {
                log::info!("👆 Clicking {token} at {point}");
                self.click_in_frame(rect, point).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
