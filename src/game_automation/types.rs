// States and reports of the tower run
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    AwaitingQuickStart,
    AwaitingNext,
    AwaitingStartBattle,
    Climbing,
    Shopping,
    Finished,
}

/// What one climbing-state poll decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// "save" was clicked, the run is over
    Finished,
    /// A shop visit was completed
    Shop,
    /// A choice dialog was resolved
    Choice,
    /// Nothing recognizable on screen
    Idle,
}

/// How a choice dialog was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKind {
    Select,
    Choice,
    Tag,
    Fallback,
}

/// Per-visit shop state, dropped when the shop flow returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopSession {
    /// 1-based visit number
    pub ordinal: u32,
    pub final_shop: bool,
    pub refreshes: u32,
}

impl ShopSession {
    pub fn new(ordinal: u32, max_shops: u32) -> Self {
        Self {
            ordinal,
            final_shop: ordinal >= max_shops,
            refreshes: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShopReport {
    pub notes_bought: u32,
    pub drinks_bought: u32,
    pub refreshes: u32,
    pub tags_clicked: u32,
    /// The exit control was missing and the run was paused
    pub paused_for_exit: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub shops_visited: u32,
    pub choices_resolved: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: u32,
    pub completed: u32,
    pub failed: u32,
    pub stopped_by_user: bool,
    /// Set when a non-recoverable error ended the batch
    pub aborted: Option<String>,
}

impl BatchSummary {
    pub fn success(&self) -> bool {
        self.aborted.is_none()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed, {} failed of {} attempted",
            self.completed, self.failed, self.attempted
        )?;
        if self.stopped_by_user {
            write!(f, " (stopped by user)")?;
        }
        if let Some(reason) = &self.aborted {
            write!(f, " (aborted: {reason})")?;
        }
        Ok(())
    }
}
