// Finite state machine for one tower run
use super::error::RunResult;
use super::match_image::Token;
use super::session::Session;
use super::shop::ShopFlow;
use super::types::{ChoiceKind, PollOutcome, RunOutcome, RunState, ShopSession};
use crate::host::HostPlatform;

pub struct RunController<'a, H: HostPlatform> {
    session: &'a Session<H>,
    state: RunState,
    shops_visited: u32,
    choices_resolved: u32,
}

impl<'a, H: HostPlatform> RunController<'a, H> {
    pub fn new(session: &'a Session<H>) -> Self {
        Self {
            session,
            state: RunState::AwaitingQuickStart,
            shops_visited: 0,
            choices_resolved: 0,
        }
    }

    /// Start as if `visited` shops were already done this run
    pub fn with_shop_count(mut self, visited: u32) -> Self {
        self.shops_visited = visited;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn shops_visited(&self) -> u32 {
        self.shops_visited
    }

    fn change_state(&mut self, new_state: RunState) {
        if self.state != new_state {
            log::debug!("🎮 Run state: {:?} -> {:?}", self.state, new_state);
            self.state = new_state;
        }
    }

    /// Entry sequence, then climb until "save" shows up
    pub async fn run(&mut self) -> RunResult<RunOutcome> {
        let session = self.session;
        let timeout = session.timing().initial_wait_timeout_ms;

        for (state, token) in [
            (RunState::AwaitingQuickStart, Token::QuickStart),
            (RunState::AwaitingNext, Token::Next),
            (RunState::AwaitingStartBattle, Token::StartBattle),
        ] {
            self.change_state(state);
            log::info!("⏳ Waiting for {token}");
            if !session.wait_and_click(token, timeout).await? {
                log::info!("⏭️ Continuing without {token}");
            }
        }
        session.control().clear_skip();

        log::info!("🗼 Entered the tower, climbing");
        self.change_state(RunState::Climbing);
        loop {
            session.burst_click().await?;
            if self.poll_once().await? == PollOutcome::Finished {
                break;
            }
        }

        self.change_state(RunState::Finished);
        Ok(RunOutcome {
            shops_visited: self.shops_visited,
            choices_resolved: self.choices_resolved,
        })
    }

    /// One climbing decision on a fresh frame, in priority order:
    /// save, shop, choice dialog, otherwise idle.
    pub async fn poll_once(&mut self) -> RunResult<PollOutcome> {
        let session = self.session;
        let frame = session.capture().await?;

        if let Some(save) = session.find(&frame, Token::Save) {
            log::info!("💾 Found save at {save}, finishing the run");
            session.click_in_frame(frame.rect(), save).await?;
            session.sleep_ms(session.timing().confirm_settle_ms).await;
            session.probe_and_click(Token::Confirm).await?;
            return Ok(PollOutcome::Finished);
        }

        let max_shops = session.config().limits.max_shops;
        if self.shops_visited < max_shops && session.find(&frame, Token::EnterShop).is_some() {
            self.change_state(RunState::Shopping);
            let shop = ShopSession::new(self.shops_visited + 1, max_shops);
            ShopFlow::new(session, shop).run().await?;
            self.shops_visited += 1;
            self.change_state(RunState::Climbing);
            return Ok(PollOutcome::Shop);
        }

        let dialog = [Token::Select, Token::Choice, Token::Tag]
            .into_iter()
            .any(|token| session.find(&frame, token).is_some());
        if dialog {
            let kind = self.resolve_choice().await?;
            log::debug!("🔀 Choice resolved via {kind:?}");
            self.choices_resolved += 1;
            return Ok(PollOutcome::Choice);
        }

        session.sleep_ms(session.timing().idle_poll_ms).await;
        Ok(PollOutcome::Idle)
    }

    /// Prefer a select reward, then a choice or tag icon, else click the
    /// conventional first-option position.
    pub async fn resolve_choice(&self) -> RunResult<ChoiceKind> {
        let session = self.session;
        let frame = session.capture().await?;
        let rect = frame.rect();

        if let Some(select) = session.find(&frame, Token::Select) {
            log::info!("👍 Select at {select}");
            session.click_in_frame(rect, select).await?;
            session.sleep_ms(session.timing().after_select_ms).await;
            session.confirm_selection().await?;
            return Ok(ChoiceKind::Select);
        }

        for (token, kind) in [(Token::Choice, ChoiceKind::Choice), (Token::Tag, ChoiceKind::Tag)] {
            if let Some(point) = session.find(&frame, token) {
                log::info!("🔀 {token} at {point}");
                session.click_in_frame(rect, point).await?;
                return Ok(kind);
            }
        }

        let layout = &session.config().layout;
        log::info!("🔀 No option icon, clicking the first option blindly");
        session
            .click_fraction(rect, layout.fallback_x, layout.fallback_y)
            .await?;
        Ok(ChoiceKind::Fallback)
    }
}
