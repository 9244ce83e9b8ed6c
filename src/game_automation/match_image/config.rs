//! Thresholds and distances for image matching

use super::template::Token;
use crate::template_matching::DEFAULT_MIN_SEPARATION;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Confidence threshold for ordinary buttons and text crops (0.0 to 1.0)
    pub default_threshold: f32,
    /// Looser threshold for the stylized select / select_confirm icons
    pub icon_threshold: f32,
    /// Stricter threshold for digit glyphs, which false-positive easily
    pub digit_threshold: f32,
    /// Minimum Manhattan distance between two reported matches (pixels)
    pub min_separation: u32,
    /// A candidate within this Manhattan distance of a sold-out marker is skipped
    pub sold_out_radius: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            default_threshold: 0.80,
            icon_threshold: 0.70,
            digit_threshold: 0.90,
            min_separation: DEFAULT_MIN_SEPARATION,
            sold_out_radius: 150,
        }
    }
}

impl MatchConfig {
    pub fn threshold_for(&self, token: Token) -> f32 {
        match token {
            Token::Select | Token::SelectConfirm => self.icon_threshold,
            Token::Hundred => self.digit_threshold,
            _ => self.default_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("default_threshold", self.default_threshold),
            ("icon_threshold", self.icon_threshold),
            ("digit_threshold", self.digit_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within 0.0..=1.0, got {value}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_token_thresholds() {
        let config = MatchConfig::default();
        assert_eq!(config.threshold_for(Token::Save), 0.80);
        assert_eq!(config.threshold_for(Token::Choice), 0.80);
        assert_eq!(config.threshold_for(Token::Select), 0.70);
        assert_eq!(config.threshold_for(Token::SelectConfirm), 0.70);
        assert_eq!(config.threshold_for(Token::Hundred), 0.90);
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let config = MatchConfig {
            digit_threshold: 1.5,
            ..MatchConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("digit_threshold"));
    }
}
