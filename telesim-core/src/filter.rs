//! Rolling-Window Z-Score Outlier Filter
//!
//! ## Overview
//!
//! Raw sensor values are noisy and occasionally wild. Before transmission,
//! each variable's stream passes through a bounded-window statistical filter:
//! the last [`WINDOW_CAPACITY`](crate::window::WINDOW_CAPACITY) raw values are
//! retained per variable, and any value whose distance from the window mean
//! reaches `threshold` standard deviations is corrected *toward the mean*
//! rather than dropped. History length is never altered by correction; the
//! stored window always holds raw values in arrival order.
//!
//! ## Policy, not errors
//!
//! Degenerate inputs are defined no-ops, never faults:
//! - fewer than `min_samples` values recorded: the raw value passes through
//!   unchanged (warm-up)
//! - zero variance across the window: the newest value is returned as-is
//!
//! ## Determinism
//!
//! The filter contains no randomness. Identical input sequences produce
//! bit-identical outputs.
//!
//! ## Threshold comparison
//!
//! A value is corrected when its z-score is at or above the threshold. With a
//! five-sample window, a single outlier among four equal values always lands
//! at a z-score of exactly 2.0 (the algebraic maximum shy of `sqrt(n-1)`), so
//! an exclusive comparison could never fire on the canonical case the filter
//! exists for.

use std::collections::HashMap;

use crate::window::{SampleWindow, WINDOW_CAPACITY};

/// Z-score distance at which a value is corrected to the window mean.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

/// Window occupancy below which the filter passes raw values through.
pub const DEFAULT_MIN_SAMPLES: usize = 5;

/// Tuning knobs for [`RollingFilter`].
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Z-score correction threshold
    pub threshold: f64,

    /// Samples required before filtering engages
    pub min_samples: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_Z_THRESHOLD,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

impl FilterConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the z-score correction threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.abs();
        self
    }

    /// Set the warm-up sample count.
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples.max(1);
        self
    }
}

/// Per-variable rolling outlier filter.
///
/// Owns one independent [`SampleWindow`] per variable, created lazily on the
/// first `record` for that variable. Constructed once at startup and owned by
/// the processing pipeline; there is no process-wide state.
#[derive(Debug, Default)]
pub struct RollingFilter {
    config: FilterConfig,
    windows: HashMap<String, SampleWindow<WINDOW_CAPACITY>>,
}

impl RollingFilter {
    /// Filter with default threshold (2.0) and warm-up (5 samples).
    pub fn new() -> Self {
        Self::with_config(FilterConfig::default())
    }

    /// Filter with custom configuration.
    pub fn with_config(config: FilterConfig) -> Self {
        Self {
            config,
            windows: HashMap::new(),
        }
    }

    /// Records a raw value for `variable` and returns the filtered value.
    ///
    /// The raw value always enters the window (evicting the oldest at
    /// capacity). Until the window holds `min_samples` values the raw input
    /// is returned unchanged. Past warm-up, every window value at or beyond
    /// the z-score threshold is treated as the mean for the purposes of this
    /// call, and the corrected newest value is returned rounded to
    /// `decimals` places. Recording is a single non-interruptible step per
    /// variable.
    pub fn record(&mut self, variable: &str, raw: f64, decimals: u32) -> f64 {
        let threshold = self.config.threshold;
        let min_samples = self.config.min_samples;

        let window = self
            .windows
            .entry(variable.to_string())
            .or_insert_with(SampleWindow::new);
        window.push(raw);

        if window.len() < min_samples {
            return raw;
        }

        let (mean, std_dev) = population_stats(window);

        if std_dev == 0.0 {
            // No variance to score against
            return round_to(window.latest().unwrap_or(raw), decimals);
        }

        // Correct the whole window view; only the last element is returned,
        // but the semantics are "corrected window tail", not "was the newest
        // sample itself an outlier".
        let corrected_last = window
            .iter()
            .map(|v| {
                let z = (v - mean).abs() / std_dev;
                if z >= threshold {
                    mean
                } else {
                    v
                }
            })
            .last()
            .unwrap_or(raw);

        round_to(corrected_last, decimals)
    }

    /// Number of raw samples currently held for `variable`.
    ///
    /// Used by the processor to stamp reading quality.
    pub fn samples_recorded(&self, variable: &str) -> usize {
        self.windows.get(variable).map_or(0, SampleWindow::len)
    }
}

/// Mean and population standard deviation over the full window.
fn population_stats<const N: usize>(window: &SampleWindow<N>) -> (f64, f64) {
    let len = window.len() as f64;
    let mean = window.iter().sum::<f64>() / len;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / len;

    (mean, variance.sqrt())
}

/// Rounds half away from zero to a fixed number of decimal places.
fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
