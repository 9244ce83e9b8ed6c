// Host module - everything the automation needs from the machine running the emulator:
// window discovery, frame capture and pointer injection.

pub mod backend;
pub mod capture;
#[cfg(feature = "desktop")]
pub mod desktop;
pub mod error;
#[cfg(feature = "desktop")]
pub mod hotkeys;
pub mod locator;
pub mod replay;
pub mod types;

pub use backend::HostBackend;
pub use capture::{Frame, FrameCapture};
pub use error::{HostError, HostResult};
pub use locator::WindowLocator;
pub use replay::ReplayHost;
pub use types::{HostPlatform, WindowInfo, WindowRect};
