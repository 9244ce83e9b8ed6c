// Game automation module
// The perception-action loop of the tower climb: control signalling, the run
// state machine, the nested shop flow and the batch driver.

pub mod config;
pub mod control;
pub mod driver;
pub mod error;
pub mod fsm;
pub mod match_image;
pub mod reward;
pub mod session;
pub mod shop;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export the main types and functions for easy access
pub use config::{BotConfig, ConfigError, LayoutConfig, RunLimits, TimingConfig};
pub use control::{ControlCommand, ControlPlane, ControlState};
pub use driver::run_batch;
pub use error::{RunError, RunResult};
pub use fsm::RunController;
pub use match_image::{Detector, MatchConfig, Template, TemplateLibrary, Token};
pub use session::Session;
pub use shop::ShopFlow;
pub use types::{
    BatchSummary, ChoiceKind, PollOutcome, RunOutcome, RunState, ShopReport, ShopSession,
};
