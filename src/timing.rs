//! # Timing Policy
//!
//! Maps the number of images in a slideshow to how long each one stays on
//! screen. More images means a shorter display time, which keeps the total
//! video length roughly bounded.

use std::collections::BTreeMap;

use crate::error::{CompositorError, ConfigError, Result};

pub const MIN_IMAGE_COUNT: u32 = 3;
pub const MAX_IMAGE_COUNT: u32 = 10;

/// Fade length used by the slideshow workflow regardless of configuration
pub const DEFAULT_FADE_DURATION: f64 = 0.2;

/// Per-image display duration keyed by (clamped) image count
pub type TimingTable = BTreeMap<u32, f64>;

/// The canonical pacing table, dense over `MIN_IMAGE_COUNT..=MAX_IMAGE_COUNT`
pub fn slideshow_image_durations() -> TimingTable {
    BTreeMap::from([
        (3, 3.8),
        (4, 3.1),
        (5, 2.6),
        (6, 2.3),
        (7, 2.1),
        (8, 1.95),
        (9, 1.85),
        (10, 1.75),
    ])
}

/// Resolve the display duration for each of `image_count` images
///
/// An empty table means no policy is in effect and `fallback` is returned as-is.
/// Otherwise the count is clamped into `[MIN_IMAGE_COUNT, MAX_IMAGE_COUNT]` and
/// looked up; a missing entry is a configuration error.
pub fn resolve_image_duration(image_count: i64, timing_table: &TimingTable, fallback: f64) -> Result<f64> {
    if image_count <= 0 {
        return Err(CompositorError::invalid_input(format!(
            "image count must be positive, got {}",
            image_count
        )));
    }

    if timing_table.is_empty() {
        return Ok(fallback);
    }

    let clamped = image_count.clamp(MIN_IMAGE_COUNT as i64, MAX_IMAGE_COUNT as i64) as u32;
    timing_table
        .get(&clamped)
        .copied()
        .ok_or_else(|| ConfigError::MissingTimingEntry { count: clamped }.into())
}
