//! Playback of a recorded ECG file.
//!
//! The file holds numeric samples separated by commas, semicolons or
//! whitespace, any number per line. Lines starting with `#` are comments.
//! Playback loops when the recording runs out.

use crate::source::driver::{DriverError, EcgDevice, EcgDriver, FrameCallback};
use crate::source::stream::{SampleGenerator, StreamingDevice};
use crate::source::types::DeviceInfo;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Parse a recording. Fails on the first token that is not a finite number.
pub fn parse_recording(content: &str) -> Result<Vec<f64>, String> {
    let mut samples = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for token in line
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            match token.parse::<f64>() {
                Ok(value) if value.is_finite() => samples.push(value),
                _ => return Err(format!("line {}: invalid sample '{token}'", line_no + 1)),
            }
        }
    }
    Ok(samples)
}

/// Loops over a shared recording.
struct Playback {
    samples: Arc<[f64]>,
    cursor: usize,
}

impl SampleGenerator for Playback {
    fn generate(&mut self, count: usize, _sampling_rate_hz: u32) -> Vec<f64> {
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            let take = (count - out.len()).min(self.samples.len() - self.cursor);
            out.extend_from_slice(&self.samples[self.cursor..self.cursor + take]);
            self.cursor = (self.cursor + take) % self.samples.len();
        }
        out
    }
}

/// Driver exposing a recording as a single device.
pub struct ReplayDriver {
    device: DeviceInfo,
    samples: Arc<[f64]>,
}

impl ReplayDriver {
    /// Load a recording; an unreadable, malformed or empty file makes the
    /// driver unavailable.
    pub fn open(path: &Path, sampling_rate_hz: u32) -> Result<Self, DriverError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DriverError::Unavailable(format!("cannot read recording {}: {e}", path.display()))
        })?;
        let samples = parse_recording(&content).map_err(|e| {
            DriverError::Unavailable(format!("malformed recording {}: {e}", path.display()))
        })?;
        if samples.is_empty() {
            return Err(DriverError::Unavailable(format!(
                "recording {} contains no samples",
                path.display()
            )));
        }

        tracing::info!(
            path = %path.display(),
            samples = samples.len(),
            seconds = samples.len() as f64 / f64::from(sampling_rate_hz.max(1)),
            "loaded recording"
        );

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording".to_string());

        Ok(Self {
            device: DeviceInfo::new(format!("Replay {name}"), path.display().to_string()),
            samples: samples.into(),
        })
    }

    /// Number of samples in the recording.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

#[async_trait]
impl EcgDriver for ReplayDriver {
    async fn detect_devices(&mut self) -> Result<Vec<DeviceInfo>, DriverError> {
        Ok(vec![self.device.clone()])
    }

    async fn connect(
        &mut self,
        device: DeviceInfo,
        callback: FrameCallback,
    ) -> Result<Box<dyn EcgDevice>, DriverError> {
        let playback = Playback {
            samples: self.samples.clone(),
            cursor: 0,
        };
        Ok(Box::new(StreamingDevice::new(device, callback, playback)))
    }
}
