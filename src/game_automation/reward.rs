// The two-step select -> select_confirm reward protocol
use super::config::TimingConfig;
use super::error::RunResult;
use super::match_image::Token;
use super::session::Session;
use crate::host::{HostPlatform, WindowRect};
use tokio::time::Instant;

impl<H: HostPlatform> Session<H> {
    /// After a "select" click: poll briefly for "select_confirm" and click it.
    ///
    /// Returns the window rect of the confirming frame, or `None` when this
    /// selection needed no confirmation.
    pub async fn confirm_selection(&self) -> RunResult<Option<WindowRect>> {
        let timing = self.timing();
        let found = self
            .wait_for(
                Token::SelectConfirm,
                timing.select_confirm_timeout_ms,
                timing.reward_poll_ms,
            )
            .await?;
        let Some((rect, point)) = found else {
            log::debug!("👍 No select_confirm, selection stands as is");
            return Ok(None);
        };
        log::info!("👍 Confirming selection at {point}");
        self.click_in_frame(rect, point).await?;
        Ok(Some(rect))
    }

    /// Claim a "thumbs" reward: wait for "select", click it, confirm, then
    /// dismiss the result with a blank click.
    pub async fn claim_reward(&self) -> RunResult<bool> {
        let timing = self.timing();
        let deadline = Instant::now() + TimingConfig::ms(timing.reward_timeout_ms);
        loop {
            if let Some((rect, point)) = self.look_for(Token::Select).await? {
                log::info!("🎁 Claiming reward at {point}");
                self.click_in_frame(rect, point).await?;
                self.sleep_ms(timing.after_select_ms).await;
                if let Some(rect) = self.confirm_selection().await? {
                    self.sleep_ms(timing.confirm_settle_ms).await;
                    self.click_blank(rect).await?;
                }
                return Ok(true);
            }
            if Instant::now() >= deadline {
                log::debug!("🎁 No reward to claim");
                return Ok(false);
            }
            self.sleep_ms(timing.reward_poll_ms).await;
        }
    }
}
