//! Data types exchanged with sensor drivers.

use serde::{Deserialize, Serialize};

/// A discovered sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Human-readable device name
    pub identifier: String,
    /// Transport address (e.g. a Bluetooth MAC)
    pub address: String,
}

impl DeviceInfo {
    /// Create a device description.
    pub fn new(identifier: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            address: address.into(),
        }
    }
}

/// Driver-supplied description of a frame's stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorMetadata {
    /// Subscribed channel path, e.g. `/Meas/ECG/250`
    pub channel: String,
    pub sampling_rate_hz: u32,
}

/// One batch of samples delivered by a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcgFrame {
    /// Milliseconds since the subscription started, one per sample
    pub timestamps: Vec<u64>,
    /// Raw amplitudes in arrival order
    pub samples: Vec<f64>,
    pub metadata: SensorMetadata,
}

impl EcgFrame {
    /// Check if the frame carries no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples in the frame.
    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Parse the sampling rate out of a channel path such as `/Meas/ECG/250`.
pub fn channel_sampling_rate(channel: &str) -> Option<u32> {
    channel
        .rsplit('/')
        .next()
        .and_then(|rate| rate.parse::<u32>().ok())
        .filter(|&rate| rate > 0)
}
