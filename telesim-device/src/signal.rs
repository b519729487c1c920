//! Synthetic Signal Sources
//!
//! Each source models one physical channel with a deterministic waveform
//! plus Gaussian noise: temperature follows daily and seasonal sinusoids,
//! humidity drifts around a base level, vibration cycles every ten seconds,
//! light tracks the hour of day. Sources round to their channel's output
//! precision; clamping keeps physically impossible values (negative lux,
//! humidity above 100 %) out of the stream.

use chrono::{DateTime, Datelike, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::f64::consts::PI;

use telesim_core::RawSample;

/// One simulated sensor channel.
///
/// `sample` takes the wall-clock instant so that time-of-day waveforms stay
/// testable; sources are stateful only through their noise generator.
pub trait SignalSource {
    /// Produces one raw measurement for the given instant.
    fn sample(&mut self, at: DateTime<Utc>) -> RawSample;
}

/// All four channels in their publishing order.
pub fn default_sources() -> Vec<Box<dyn SignalSource>> {
    vec![
        Box::new(TemperatureSignal::new()),
        Box::new(HumiditySignal::new()),
        Box::new(VibrationSignal::new()),
        Box::new(LightSignal::new()),
    ]
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Ambient temperature: 25 °C base, daily and seasonal sinusoids, σ=1.5 noise.
pub struct TemperatureSignal {
    rng: StdRng,
}

impl TemperatureSignal {
    /// Source with an entropy-seeded noise generator.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for TemperatureSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for TemperatureSignal {
    fn sample(&mut self, at: DateTime<Utc>) -> RawSample {
        let daily = 5.0 * (2.0 * PI * f64::from(at.hour()) / 24.0).sin();
        let seasonal = 3.0 * (2.0 * PI * f64::from(at.ordinal()) / 365.0).sin();
        let noise: f64 = self.rng.sample(StandardNormal);

        let value = 25.0 + daily + seasonal + noise * 1.5;
        RawSample::new("temperature", round_to(value, 2), "°C", 2)
    }
}

/// Relative humidity: 60 % base, ±0.5 uniform drift, σ=3 noise, clamped 0–100.
pub struct HumiditySignal {
    rng: StdRng,
}

impl HumiditySignal {
    /// Source with an entropy-seeded noise generator.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for HumiditySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for HumiditySignal {
    fn sample(&mut self, _at: DateTime<Utc>) -> RawSample {
        let drift = self.rng.gen_range(-0.5..=0.5);
        let noise: f64 = self.rng.sample(StandardNormal);

        let value = (60.0 + drift + noise * 3.0).clamp(0.0, 100.0);
        RawSample::new("humidity", round_to(value, 2), "%", 2)
    }
}

/// Vibration: 0.5 g base, ten-second sinusoid of amplitude 2, σ=0.3 noise.
pub struct VibrationSignal {
    rng: StdRng,
}

impl VibrationSignal {
    /// Source with an entropy-seeded noise generator.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for VibrationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for VibrationSignal {
    fn sample(&mut self, at: DateTime<Utc>) -> RawSample {
        let phase = at.timestamp() as f64;
        let periodic = 2.0 * (2.0 * PI * phase / 10.0).sin();
        let noise: f64 = self.rng.sample(StandardNormal);

        let value = (0.5 + periodic + noise * 0.3).max(0.0);
        RawSample::new("vibration", round_to(value, 3), "g", 3)
    }
}

/// Illuminance: daylight ramp between 06 and 18 h, 50 lux at night, σ=20 noise.
pub struct LightSignal {
    rng: StdRng,
}

impl LightSignal {
    /// Source with an entropy-seeded noise generator.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for LightSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for LightSignal {
    fn sample(&mut self, at: DateTime<Utc>) -> RawSample {
        let hour = at.hour();
        let base = if (6..=18).contains(&hour) {
            500.0 + 300.0 * (PI * f64::from(hour - 6) / 12.0).sin()
        } else {
            50.0
        };
        let noise: f64 = self.rng.sample(StandardNormal);

        let value = (base + noise * 20.0).max(0.0);
        RawSample::new("light", round_to(value, 2), "lux", 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap()
    }

    fn midnight() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 25, 0, 0, 0).unwrap()
    }

    #[test]
    fn temperature_metadata_and_plausible_range() {
        let mut signal = TemperatureSignal::seeded(42);

        for _ in 0..100 {
            let sample = signal.sample(noon());
            assert_eq!(sample.variable, "temperature");
            assert_eq!(sample.unit, "°C");
            assert_eq!(sample.decimals, 2);
            // base 25 ± (5 daily + 3 seasonal) plus noise
            assert!(sample.value > 0.0 && sample.value < 50.0);
        }
    }

    #[test]
    fn humidity_is_clamped_to_percent_range() {
        let mut signal = HumiditySignal::seeded(42);

        for _ in 0..200 {
            let sample = signal.sample(noon());
            assert_eq!(sample.variable, "humidity");
            assert_eq!(sample.unit, "%");
            assert!((0.0..=100.0).contains(&sample.value));
        }
    }

    #[test]
    fn vibration_never_negative_and_three_decimals() {
        let mut signal = VibrationSignal::seeded(42);

        for offset in 0..200 {
            let at = noon() + chrono::Duration::seconds(offset);
            let sample = signal.sample(at);
            assert_eq!(sample.variable, "vibration");
            assert_eq!(sample.unit, "g");
            assert_eq!(sample.decimals, 3);
            assert!(sample.value >= 0.0);
            // rounded to three places
            let scaled = sample.value * 1000.0;
            assert!((scaled - scaled.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn light_differs_between_day_and_night() {
        let mut signal = LightSignal::seeded(42);

        let day: f64 = (0..50).map(|_| signal.sample(noon()).value).sum::<f64>() / 50.0;
        let night: f64 = (0..50).map(|_| signal.sample(midnight()).value).sum::<f64>() / 50.0;

        // noon base is 800 lux, night base is 50; noise is σ=20
        assert!(day > 600.0);
        assert!(night < 200.0);

        let sample = signal.sample(midnight());
        assert!(sample.value >= 0.0);
        assert_eq!(sample.unit, "lux");
    }

    #[test]
    fn default_sources_cover_all_channels_in_order() {
        let mut sources = default_sources();
        let variables: Vec<String> = sources
            .iter_mut()
            .map(|s| s.sample(noon()).variable)
            .collect();
        assert_eq!(variables, ["temperature", "humidity", "vibration", "light"]);
    }
}
