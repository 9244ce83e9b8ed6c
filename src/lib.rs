pub mod game_automation;
pub mod host;
pub mod template_matching;

pub use game_automation::{BotConfig, ControlPlane, RunController, Session};
pub use host::{HostBackend, HostPlatform};
