//! Image matching for the tower automation
//!
//! Maps the fixed token vocabulary to reference images and runs the
//! correlation matcher over captured frames with per-token thresholds.

pub mod config;
pub mod detector;
pub mod template;

pub use config::MatchConfig;
pub use detector::Detector;
pub use template::{Template, TemplateLibrary, Token};
