//! Bot configuration: every calibration constant of the tower loop in one place

use super::match_image::MatchConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::time::Duration;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Delays and timeouts, all in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub restore_settle_ms: u64,
    pub initial_wait_timeout_ms: u64,
    pub wait_poll_ms: u64,
    pub burst_interval_ms: u64,
    pub burst_duration_ms: u64,
    pub idle_poll_ms: u64,
    pub overlay_clicks: u32,
    pub overlay_interval_ms: u64,
    pub after_select_ms: u64,
    pub select_confirm_timeout_ms: u64,
    pub reward_timeout_ms: u64,
    pub reward_poll_ms: u64,
    pub bubble_settle_ms: u64,
    pub item_settle_ms: u64,
    pub buy_settle_ms: u64,
    pub confirm_settle_ms: u64,
    pub refresh_settle_ms: u64,
    pub tag_settle_ms: u64,
    pub exit_settle_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            restore_settle_ms: 500,
            initial_wait_timeout_ms: 60_000,
            wait_poll_ms: 500,
            burst_interval_ms: 50,
            burst_duration_ms: 1_500,
            idle_poll_ms: 200,
            overlay_clicks: 20,
            overlay_interval_ms: 50,
            after_select_ms: 300,
            select_confirm_timeout_ms: 3_000,
            reward_timeout_ms: 6_000,
            reward_poll_ms: 200,
            bubble_settle_ms: 800,
            item_settle_ms: 300,
            buy_settle_ms: 400,
            confirm_settle_ms: 200,
            refresh_settle_ms: 1_000,
            tag_settle_ms: 500,
            exit_settle_ms: 500,
            retry_delay_ms: 3_000,
        }
    }
}

impl TimingConfig {
    pub fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }
}

/// Click positions relative to the emulator window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal offset of the "blank" fast-forward / overlay-dismiss click
    pub blank_x_offset: i32,
    /// Horizontal offset of the three dialog bubbles
    pub bubble_x_offset: i32,
    /// Bubble heights as fractions of the window height, top to bottom
    pub bubble_heights: [f32; 3],
    /// Blind option click when a dialog carries no recognizable icon
    pub fallback_x: f32,
    pub fallback_y: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            blank_x_offset: 10,
            bubble_x_offset: 500,
            bubble_heights: [0.40, 0.60, 0.80],
            fallback_x: 0.2,
            fallback_y: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLimits {
    pub max_runs: u32,
    pub max_shops: u32,
    /// Paid stock rerolls, final shop only
    pub max_refreshes: u32,
    /// Upper bound on purchases in one purchase loop
    pub max_purchases: u32,
    /// Upper bound on tag clicks in the final-shop sweep
    pub max_tag_clicks: u32,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_runs: 7,
            max_shops: 4,
            max_refreshes: 2,
            max_purchases: 30,
            max_tag_clicks: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Case-insensitive substrings identifying the emulator window title
    pub window_filters: Vec<String>,
    pub matching: MatchConfig,
    pub timing: TimingConfig,
    pub layout: LayoutConfig,
    pub limits: RunLimits,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            window_filters: vec!["mumu".to_string(), "模拟器".to_string()],
            matching: MatchConfig::default(),
            timing: TimingConfig::default(),
            layout: LayoutConfig::default(),
            limits: RunLimits::default(),
        }
    }
}

impl BotConfig {
    pub fn from_json(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: BotConfig = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Defaults, overridden by the JSON file when one is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let config = Self::from_file(path)?;
                log::info!("⚙️ Loaded config from {}", path.display());
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matching.validate().map_err(ConfigError::Invalid)?;
        if self.window_filters.iter().all(|f| f.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "window_filters needs at least one non-empty title substring".to_string(),
            ));
        }
        if let Some(h) = self
            .layout
            .bubble_heights
            .iter()
            .find(|h| !(0.0..=1.0).contains(*h))
        {
            return Err(ConfigError::Invalid(format!(
                "bubble height {h} is not a fraction of the window height"
            )));
        }
        if self.limits.max_shops == 0 {
            return Err(ConfigError::Invalid("max_shops must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.limits.max_runs, 7);
        assert_eq!(config.limits.max_shops, 4);
        assert_eq!(config.limits.max_refreshes, 2);
        assert_eq!(config.matching.sold_out_radius, 150);
        assert_eq!(config.timing.initial_wait_timeout_ms, 60_000);
        assert_eq!(config.layout.bubble_heights, [0.40, 0.60, 0.80]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "matching": {{ "digit_threshold": 0.95 }}, "limits": {{ "max_runs": 3 }} }}"#
        )
        .unwrap();

        let config = BotConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.matching.digit_threshold, 0.95);
        assert_eq!(config.matching.default_threshold, 0.80);
        assert_eq!(config.limits.max_runs, 3);
        assert_eq!(config.limits.max_shops, 4);
        assert_eq!(config.window_filters, vec!["mumu", "模拟器"]);
    }

    #[test]
    fn test_malformed_json() {
        let err = BotConfig::from_json("{ not json", Path::new("bot.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BotConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = BotConfig::from_json(
            r#"{ "layout": { "bubble_heights": [0.4, 0.6, 1.8] } }"#,
            Path::new("bot.json"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = BotConfig::from_json(r#"{ "window_filters": [] }"#, Path::new("bot.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
