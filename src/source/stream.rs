//! Real-time frame delivery shared by the built-in drivers.
//!
//! A [`StreamingDevice`] owns a sample generator. Subscribing moves the
//! generator into a background task that emits one frame every
//! [`FRAME_PERIOD`], sized so the long-run rate matches the subscribed
//! channel's sampling rate.

use crate::source::driver::{DriverError, EcgDevice, FrameCallback};
use crate::source::types::{channel_sampling_rate, DeviceInfo, EcgFrame, SensorMetadata};
use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Cadence at which frames are pushed to the callback.
pub const FRAME_PERIOD: Duration = Duration::from_millis(40);

/// Produces raw samples on demand.
pub trait SampleGenerator: Send + 'static {
    fn generate(&mut self, count: usize, sampling_rate_hz: u32) -> Vec<f64>;
}

/// A device whose frames come from a local generator.
pub struct StreamingDevice<G: SampleGenerator> {
    device: DeviceInfo,
    callback: FrameCallback,
    generator: Option<G>,
    started: bool,
    task: Option<JoinHandle<()>>,
}

impl<G: SampleGenerator> StreamingDevice<G> {
    /// Create a stopped device.
    pub fn new(device: DeviceInfo, callback: FrameCallback, generator: G) -> Self {
        Self {
            device,
            callback,
            generator: Some(generator),
            started: false,
            task: None,
        }
    }

    /// Check if the device is producing frames.
    pub fn is_streaming(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn abort_stream(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<G: SampleGenerator> Drop for StreamingDevice<G> {
    fn drop(&mut self) {
        self.abort_stream();
    }
}

fn rejected(channel: &str, reason: &str) -> DriverError {
    DriverError::Subscription {
        channel: channel.to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl<G: SampleGenerator> EcgDevice for StreamingDevice<G> {
    async fn start(&mut self) -> Result<(), DriverError> {
        self.started = true;
        tracing::debug!(device = %self.device.identifier, "device started");
        Ok(())
    }

    async fn subscribe(&mut self, channel: &str) -> Result<(), DriverError> {
        if !self.started {
            return Err(DriverError::NotConnected);
        }
        let rate = channel_sampling_rate(channel)
            .ok_or_else(|| rejected(channel, "channel path does not end in a sampling rate"))?;
        let generator = self
            .generator
            .take()
            .ok_or_else(|| rejected(channel, "stream already consumed"))?;

        let metadata = SensorMetadata {
            channel: channel.to_string(),
            sampling_rate_hz: rate,
        };
        let frames = stream_frames(
            generator,
            metadata,
            self.device.clone(),
            self.callback.clone(),
        );
        self.task = Some(tokio::spawn(frames));
        Ok(())
    }

    async fn unsubscribe_all(&mut self) -> Result<(), DriverError> {
        self.abort_stream();
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DriverError> {
        self.abort_stream();
        self.started = false;
        tracing::debug!(device = %self.device.identifier, "device stopped");
        Ok(())
    }
}

async fn stream_frames<G: SampleGenerator>(
    mut generator: G,
    metadata: SensorMetadata,
    device: DeviceInfo,
    callback: FrameCallback,
) {
    let rate = u64::from(metadata.sampling_rate_hz);
    let mut ticker = tokio::time::interval(FRAME_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let origin = Instant::now();
    let mut emitted: u64 = 0;

    loop {
        ticker.tick().await;

        let due = (origin.elapsed().as_secs_f64() * rate as f64) as u64;
        let count = due.saturating_sub(emitted) as usize;
        if count == 0 {
            continue;
        }

        let samples = generator.generate(count, metadata.sampling_rate_hz);
        let timestamps = (emitted..emitted + count as u64)
            .map(|i| i * 1000 / rate)
            .collect();
        emitted += count as u64;

        callback(
            &device,
            EcgFrame {
                timestamps,
                samples,
                metadata: metadata.clone(),
            },
        );
    }
}
