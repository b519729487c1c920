//! Telemetry Data Model
//!
//! Raw samples come from a signal source, processed readings go out on the
//! wire. The JSON shape of [`Reading`] and [`Envelope`] is the broker-facing
//! contract:
//!
//! ```json
//! {
//!   "device": "device_001",
//!   "data": [
//!     {
//!       "variable": "temperature",
//!       "value": 25.31,
//!       "unit": "°C",
//!       "timestamp": "2026-08-25T12:00:00Z",
//!       "device_id": "device_001",
//!       "device_name": "Sensor_Temperature_001",
//!       "processed": true,
//!       "quality": "good"
//!     }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence marker for a processed reading.
///
/// `Good` once the variable's window held at least three samples when the
/// reading was filtered; `Initializing` before that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Window still warming up
    Initializing,
    /// Enough history for the filter to be meaningful
    Good,
}

/// One raw measurement as produced by a signal source.
///
/// `decimals` is the fixed output precision for the variable: the source
/// knows its own resolution (two places for temperature, humidity and light;
/// three for vibration).
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Sensor channel name (e.g. "temperature")
    pub variable: String,
    /// Raw, unfiltered value
    pub value: f64,
    /// Unit of measure (e.g. "°C")
    pub unit: String,
    /// Decimal places for the filtered output
    pub decimals: u32,
}

impl RawSample {
    /// Convenience constructor.
    pub fn new(
        variable: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        decimals: u32,
    ) -> Self {
        Self {
            variable: variable.into(),
            value,
            unit: unit.into(),
            decimals,
        }
    }
}

/// A processed reading, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Sensor channel name
    pub variable: String,
    /// Filtered value (raw only while the window warms up)
    pub value: f64,
    /// Unit of measure
    pub unit: String,
    /// Wall-clock time of processing, RFC 3339 on the wire
    pub timestamp: DateTime<Utc>,
    /// Owning device identifier
    pub device_id: String,
    /// Human-readable device name
    pub device_name: String,
    /// Always true for readings that went through the processor
    pub processed: bool,
    /// Confidence marker
    pub quality: Quality,
}

/// Outbound message payload: one batch of readings for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Device identifier, duplicated from the readings for broker-side routing
    pub device: String,
    /// Readings in processing order
    pub data: Vec<Reading>,
}

impl Envelope {
    /// Wraps a batch of readings for a device.
    pub fn new(device: impl Into<String>, data: Vec<Reading>) -> Self {
        Self {
            device: device.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(variable: &str, value: f64) -> Reading {
        Reading {
            variable: variable.into(),
            value,
            unit: "°C".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap(),
            device_id: "device_001".into(),
            device_name: "Sensor_Temperature_001".into(),
            processed: true,
            quality: Quality::Good,
        }
    }

    #[test]
    fn quality_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Quality::Good).unwrap(), "\"good\"");
        assert_eq!(
            serde_json::to_string(&Quality::Initializing).unwrap(),
            "\"initializing\""
        );
    }

    #[test]
    fn reading_wire_shape() {
        let json = serde_json::to_value(reading("temperature", 25.31)).unwrap();

        assert_eq!(json["variable"], "temperature");
        assert_eq!(json["value"], 25.31);
        assert_eq!(json["unit"], "°C");
        assert_eq!(json["device_id"], "device_001");
        assert_eq!(json["device_name"], "Sensor_Temperature_001");
        assert_eq!(json["processed"], true);
        assert_eq!(json["quality"], "good");
        // RFC 3339 timestamp
        assert!(json["timestamp"].as_str().unwrap().starts_with("2026-08-25T12:00:00"));
    }

    #[test]
    fn envelope_round_trip_preserves_order() {
        let batch = Envelope::new(
            "device_001",
            vec![
                reading("temperature", 25.31),
                reading("humidity", 61.2),
                reading("vibration", 0.512),
                reading("light", 640.0),
            ],
        );

        let payload = serde_json::to_string(&batch).unwrap();
        let parsed: Envelope = serde_json::from_str(&payload).unwrap();

        assert_eq!(parsed.device, "device_001");
        assert_eq!(parsed.data.len(), 4);
        for (original, decoded) in batch.data.iter().zip(&parsed.data) {
            assert_eq!(original.variable, decoded.variable);
            assert_eq!(original.value, decoded.value);
            assert_eq!(original.unit, decoded.unit);
        }
    }
}
