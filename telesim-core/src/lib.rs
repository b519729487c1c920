//! Core filtering pipeline for Telesim
//!
//! Cleans per-variable sensor value streams with a bounded-window z-score
//! filter before they go out on the wire. Signal synthesis and transport
//! live in sibling crates; this one owns the data model and the stateful
//! part worth getting right: the rolling window and the batch processor.
//!
//! ```
//! use telesim_core::{RawSample, SampleProcessor};
//!
//! let mut processor = SampleProcessor::new("device_001", "Sensor_Temperature_001");
//!
//! let batch = [RawSample::new("temperature", 25.3, "°C", 2)];
//! let readings = processor.process_batch(&batch);
//! assert!(readings[0].processed);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod filter;
pub mod processor;
pub mod reading;
pub mod time;
pub mod window;

// Public API
pub use filter::{FilterConfig, RollingFilter};
pub use processor::SampleProcessor;
pub use reading::{Envelope, Quality, RawSample, Reading};
pub use time::{Clock, FixedClock, SystemClock};

/// Crate version, for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
