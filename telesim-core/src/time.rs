//! Clock abstraction for timestamping readings
//!
//! Readings carry wall-clock timestamps, but the processor should not reach
//! for the system clock directly or tests become time-dependent. A `Clock`
//! is injected at construction; production uses [`SystemClock`], tests use a
//! settable [`FixedClock`].

use chrono::{DateTime, Duration, Utc};

/// Source of wall-clock time.
pub trait Clock: Send {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// System wall clock.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: DateTime<Utc>,
}

impl FixedClock {
    /// Clock frozen at the given instant.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }

    /// Moves the clock to a new instant.
    pub fn set(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, duration: Duration) {
        self.timestamp += duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_advances() {
        let start = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        let mut clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(10));
        assert_eq!(clock.now(), start + Duration::seconds(10));
    }
}
