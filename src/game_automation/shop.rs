// Shop visit: bubbles, purchase loops, refreshes and exit
use super::error::RunResult;
use super::match_image::Token;
use super::session::Session;
use super::types::{ShopReport, ShopSession};
use crate::host::HostPlatform;

/// Bubble indices of the three-option shop dialog
const BUBBLE_ENTER: usize = 0;
const BUBBLE_REWARD: usize = 1;
const BUBBLE_DONE: usize = 2;

pub struct ShopFlow<'a, H: HostPlatform> {
    session: &'a Session<H>,
    shop: ShopSession,
    report: ShopReport,
}

impl<'a, H: HostPlatform> ShopFlow<'a, H> {
    pub fn new(session: &'a Session<H>, shop: ShopSession) -> Self {
        Self {
            session,
            shop,
            report: ShopReport::default(),
        }
    }

    pub async fn run(mut self) -> RunResult<ShopReport> {
        let max_shops = self.session.config().limits.max_shops;
        log::info!(
            "🛒 Shop {}/{}{}",
            self.shop.ordinal,
            max_shops,
            if self.shop.final_shop { " (final)" } else { "" }
        );

        self.click_bubble(BUBBLE_REWARD).await?;
        self.session.claim_reward().await?;
        self.click_bubble(BUBBLE_REWARD).await?;
        self.session.claim_reward().await?;
        self.click_bubble(BUBBLE_ENTER).await?;

        self.purchase_round().await?;

        if self.shop.final_shop {
            self.refresh_cycles().await?;
        }

        self.exit().await?;
        self.click_bubble(BUBBLE_DONE).await?;

        if self.shop.final_shop && self.session.probe_and_click(Token::Confirm).await? {
            log::info!("✅ Acknowledged the final shop");
        }

        self.report.refreshes = self.shop.refreshes;
        log::info!(
            "🛒 Shop {} done: {} notes, {} drinks, {} refreshes",
            self.shop.ordinal,
            self.report.notes_bought,
            self.report.drinks_bought,
            self.report.refreshes
        );
        Ok(self.report)
    }

    async fn click_bubble(&self, index: usize) -> RunResult<()> {
        let layout = &self.session.config().layout;
        let rect = self.session.window_rect().await?;
        let dy = (rect.height as f32 * layout.bubble_heights[index]) as i32;
        log::debug!("💬 Bubble {index}");
        self.session
            .click_offset(rect, layout.bubble_x_offset, dy)
            .await?;
        self.session
            .sleep_ms(self.session.timing().bubble_settle_ms)
            .await;
        Ok(())
    }

    async fn purchase_round(&mut self) -> RunResult<()> {
        self.report.notes_bought += self.buy_all(Token::Note, false).await?;
        self.report.drinks_bought += self.buy_all(Token::Hundred, true).await?;
        Ok(())
    }

    /// Buy every purchasable `token` item, one at a time.
    ///
    /// Rescans after each purchase since the layout and sold-out markers change.
    /// Stops when nothing purchasable is left, when a whole pass bought
    /// nothing, or when the game reports insufficient funds.
    async fn buy_all(&self, token: Token, with_reward: bool) -> RunResult<u32> {
        let session = self.session;
        let timing = session.timing();
        let cap = session.config().limits.max_purchases;
        let mut bought = 0;

        'scan: loop {
            let frame = session.capture().await?;
            let candidates = session.detector().find_unsold(&frame, token);
            if candidates.is_empty() {
                break;
            }

            for candidate in candidates {
                session.click_in_frame(frame.rect(), candidate).await?;
                session.sleep_ms(timing.item_settle_ms).await;

                let Some((rect, buy)) = session.look_for(Token::Buy).await? else {
                    log::debug!("🛒 No buy button for {token} at {candidate}");
                    continue;
                };
                session.click_in_frame(rect, buy).await?;
                session.sleep_ms(timing.buy_settle_ms).await;

                let after = session.capture().await?;
                if session.find(&after, Token::NotEnoughMoney).is_some() {
                    log::warn!("💸 Not enough money for {token}, ending this purchase loop");
                    session.clear_overlay(after.rect()).await?;
                    break 'scan;
                }
                if let Some(confirm) = session.find(&after, Token::Confirm) {
                    session.click_in_frame(after.rect(), confirm).await?;
                    session.sleep_ms(timing.confirm_settle_ms).await;
                }
                session.clear_overlay(after.rect()).await?;

                bought += 1;
                log::info!("🛍️ Bought {token} #{bought}");
                if with_reward {
                    session.claim_reward().await?;
                }
                if bought >= cap {
                    log::warn!("🛒 Purchase cap {cap} reached for {token}");
                    break 'scan;
                }
                continue 'scan;
            }

            // Candidates were on screen but none led to a buy button
            log::warn!("🛒 {token} candidates left but none purchasable, giving up on this screen");
            break;
        }
        Ok(bought)
    }

    async fn refresh_cycles(&mut self) -> RunResult<()> {
        let session = self.session;
        let limits = &session.config().limits;
        while self.shop.refreshes < limits.max_refreshes {
            let Some((rect, point)) = session.look_for(Token::Refresh).await? else {
                log::info!("🔄 No refresh available");
                break;
            };
            session.click_in_frame(rect, point).await?;
            session.sleep_ms(session.timing().refresh_settle_ms).await;
            self.shop.refreshes += 1;
            log::info!("🔄 Refreshed stock ({}/{})", self.shop.refreshes, limits.max_refreshes);
            self.purchase_round().await?;
        }

        if limits.max_refreshes > 0 && self.shop.refreshes == limits.max_refreshes {
            self.tag_sweep().await?;
        }
        Ok(())
    }

    /// Pick every tagged option left after the last refresh
    async fn tag_sweep(&mut self) -> RunResult<()> {
        let session = self.session;
        let cap = session.config().limits.max_tag_clicks;
        while self.report.tags_clicked < cap {
            let Some((rect, point)) = session.look_for(Token::Tag).await? else {
                break;
            };
            session.click_in_frame(rect, point).await?;
            session.sleep_ms(session.timing().tag_settle_ms).await;
            self.report.tags_clicked += 1;
        }
        if self.report.tags_clicked > 0 {
            log::info!("🏷️ Picked {} tag options", self.report.tags_clicked);
        }
        Ok(())
    }

    async fn exit(&mut self) -> RunResult<()> {
        let session = self.session;
        let frame = session.capture().await?;
        match session.find(&frame, Token::Back) {
            Some(back) => {
                session.click_blank(frame.rect()).await?;
                session.click_in_frame(frame.rect(), back).await?;
                session.sleep_ms(session.timing().exit_settle_ms).await;
            }
            None if self.shop.final_shop => {
                log::warn!("⚠️ No back button in the final shop, pausing for manual help (press P to resume)");
                self.report.paused_for_exit = true;
                session.control().pause();
            }
            None => log::warn!("⚠️ No back button in shop {}", self.shop.ordinal),
        }
        Ok(())
    }
}
