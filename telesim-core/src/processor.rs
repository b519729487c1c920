//! Batch Sample Processing
//!
//! The processor sits between signal generation and publishing: it routes
//! every raw sample through the per-variable [`RollingFilter`], stamps device
//! identity and wall-clock time, and marks quality. Output order always
//! matches input order; the only state shared across calls is the filter's
//! per-variable windows, which is the whole point of a rolling window.

use crate::filter::RollingFilter;
use crate::reading::{Quality, RawSample, Reading};
use crate::time::{Clock, SystemClock};

/// Window occupancy at which a reading is stamped [`Quality::Good`].
pub const QUALITY_WARMUP_SAMPLES: usize = 3;

/// Turns raw samples into processed readings.
///
/// Owns the filter (no process-wide state); constructed once at startup and
/// driven by the foreground loop. Per-variable recording is a single atomic
/// step: a batch is never left with a half-updated window.
pub struct SampleProcessor {
    filter: RollingFilter,
    device_id: String,
    device_name: String,
    clock: Box<dyn Clock>,
}

impl SampleProcessor {
    /// Processor with a default filter and the system clock.
    pub fn new(device_id: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self::with_filter(device_id, device_name, RollingFilter::new())
    }

    /// Processor with a custom filter.
    pub fn with_filter(
        device_id: impl Into<String>,
        device_name: impl Into<String>,
        filter: RollingFilter,
    ) -> Self {
        Self {
            filter,
            device_id: device_id.into(),
            device_name: device_name.into(),
            clock: Box::new(SystemClock),
        }
    }

    /// Replaces the clock; used by tests for deterministic timestamps.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Processes one batch of raw samples into readings.
    ///
    /// Each sample's value passes through its variable's rolling filter;
    /// quality is `Good` once the window holds at least
    /// [`QUALITY_WARMUP_SAMPLES`] values, `Initializing` before that.
    pub fn process_batch(&mut self, samples: &[RawSample]) -> Vec<Reading> {
        let timestamp = self.clock.now();

        samples
            .iter()
            .map(|sample| {
                let value = self
                    .filter
                    .record(&sample.variable, sample.value, sample.decimals);

                let quality = if self.filter.samples_recorded(&sample.variable)
                    >= QUALITY_WARMUP_SAMPLES
                {
                    Quality::Good
                } else {
                    Quality::Initializing
                };

                log::debug!(
                    "processed {}: raw {} -> {} ({:?})",
                    sample.variable,
                    sample.value,
                    value,
                    quality
                );

                Reading {
                    variable: sample.variable.clone(),
                    value,
                    unit: sample.unit.clone(),
                    timestamp,
                    device_id: self.device_id.clone(),
                    device_name: self.device_name.clone(),
                    processed: true,
                    quality,
                }
            })
            .collect()
    }

    /// Device identifier stamped on every reading.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use chrono::{TimeZone, Utc};

    fn sample(variable: &str, value: f64) -> RawSample {
        RawSample::new(variable, value, "°C", 2)
    }

    fn processor() -> SampleProcessor {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap());
        SampleProcessor::new("device_001", "Sensor_Temperature_001").with_clock(Box::new(clock))
    }

    #[test]
    fn stamps_identity_and_metadata() {
        let mut processor = processor();

        let readings = processor.process_batch(&[sample("temperature", 25.0)]);
        assert_eq!(readings.len(), 1);

        let reading = &readings[0];
        assert_eq!(reading.variable, "temperature");
        assert_eq!(reading.device_id, "device_001");
        assert_eq!(reading.device_name, "Sensor_Temperature_001");
        assert!(reading.processed);
        assert_eq!(
            reading.timestamp,
            Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn output_order_matches_input() {
        let mut processor = processor();

        let batch = [
            sample("temperature", 25.0),
            sample("humidity", 60.0),
            sample("vibration", 0.5),
            sample("light", 500.0),
        ];
        let readings = processor.process_batch(&batch);

        let variables: Vec<&str> = readings.iter().map(|r| r.variable.as_str()).collect();
        assert_eq!(variables, vec!["temperature", "humidity", "vibration", "light"]);
    }

    #[test]
    fn quality_transitions_at_three_samples() {
        let mut processor = processor();

        for expected in [
            Quality::Initializing,
            Quality::Initializing,
            Quality::Good,
            Quality::Good,
        ] {
            let readings = processor.process_batch(&[sample("temperature", 25.0)]);
            assert_eq!(readings[0].quality, expected);
        }
    }

    #[test]
    fn filter_state_persists_across_batches() {
        let mut processor = processor();

        // Warm the window up one batch at a time
        for v in [10.0, 10.0, 10.0, 10.0] {
            processor.process_batch(&[sample("temperature", v)]);
        }

        // Fifth batch: the canonical outlier is corrected to the mean
        let readings = processor.process_batch(&[sample("temperature", 100.0)]);
        assert_eq!(readings[0].value, 28.0);
        assert_eq!(readings[0].quality, Quality::Good);
    }

    #[test]
    fn quality_is_per_variable() {
        let mut processor = processor();

        for _ in 0..3 {
            processor.process_batch(&[sample("temperature", 25.0)]);
        }

        let readings = processor.process_batch(&[
            sample("temperature", 25.0),
            sample("humidity", 60.0),
        ]);

        assert_eq!(readings[0].quality, Quality::Good);
        assert_eq!(readings[1].quality, Quality::Initializing);
    }
}
