/// Template matching module for locating UI tokens in emulator frames
///
/// This module provides:
/// - Zero-mean normalized cross-correlation scoring over grayscale frames
/// - Coarse-to-fine pyramid search for emulator-sized frames
/// - Single best match with an inclusive confidence threshold
/// - All matches above a threshold with spatial de-duplication
/// - Proximity filtering of candidates against marker positions
pub mod matcher;
pub mod types;

pub use matcher::{DEFAULT_MIN_SEPARATION, TemplateMatcher, dedupe, exclude_near, pyramid_depth};
pub use types::{Match, Point, ScoreMap};
