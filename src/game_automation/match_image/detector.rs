//! Token detection on captured frames

use super::config::MatchConfig;
use super::template::{TemplateLibrary, Token};
use crate::host::Frame;
use crate::template_matching::{Match, Point, TemplateMatcher, exclude_near};

/// Looks up templates and runs the matcher with per-token thresholds.
///
/// A token whose template is not loaded is never found.
#[derive(Debug, Clone)]
pub struct Detector {
    library: TemplateLibrary,
    matcher: TemplateMatcher,
    config: MatchConfig,
}

impl Detector {
    pub fn new(library: TemplateLibrary, config: MatchConfig) -> Self {
        Self {
            library,
            matcher: TemplateMatcher::new(config.min_separation),
            config,
        }
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Best match centre of `token`, using its configured threshold
    pub fn find(&self, frame: &Frame, token: Token) -> Option<Point> {
        self.find_at(frame, token, self.config.threshold_for(token))
    }

    pub fn find_at(&self, frame: &Frame, token: Token, threshold: f32) -> Option<Point> {
        let template = self.library.get(token)?;
        let found = self
            .matcher
            .find_best(frame.luma(), &template.image, threshold);
        if let Some(point) = found {
            log::debug!("🎯 {} at {}", token, point);
        }
        found
    }

    /// Every de-duplicated occurrence of `token`
    pub fn find_all(&self, frame: &Frame, token: Token) -> Vec<Point> {
        let Some(template) = self.library.get(token) else {
            return Vec::new();
        };
        self.matcher.find_all(
            frame.luma(),
            &template.image,
            self.config.threshold_for(token),
        )
    }

    /// Occurrences of `token` that are not covered by a sold-out marker
    pub fn find_unsold(&self, frame: &Frame, token: Token) -> Vec<Point> {
        let candidates = self.find_all(frame, token);
        if candidates.is_empty() {
            return candidates;
        }
        let markers = self.find_all(frame, Token::SoldOut);
        let unsold = exclude_near(&candidates, &markers, self.config.sold_out_radius);
        log::debug!(
            "🏷️ {}: {} candidates, {} sold-out markers, {} purchasable",
            token,
            candidates.len(),
            markers.len(),
            unsold.len()
        );
        unsold
    }

    /// Best match of `token` regardless of threshold, for calibration output
    pub fn probe(&self, frame: &Frame, token: Token) -> Option<Match> {
        let template = self.library.get(token)?;
        self.matcher.best_match(frame.luma(), &template.image)
    }
}
