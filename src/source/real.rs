//! Live sensor input.
//!
//! Discovers a device, subscribes to its ECG channel and feeds every frame
//! the driver pushes into the pipeline. Whatever happens after connecting,
//! the device is unsubscribed and then stopped before `run` returns.

use crate::config::Config;
use crate::core::EcgPipeline;
use crate::output::MetricSink;
use crate::session::SharedSessionStats;
use crate::shutdown::Shutdown;
use crate::source::driver::{EcgDevice, EcgDriver, FrameCallback};
use crate::source::types::{DeviceInfo, EcgFrame};
use crate::source::SourceError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::MissedTickBehavior;

/// Upper bound on how long the stream loop sleeps without checking for shutdown.
pub const IDLE_TICK: Duration = Duration::from_secs(1);

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Disconnected,
    Discovering,
    Connected,
    Streaming,
    Stopping,
}

/// Drives a sensor driver and feeds the pipeline.
pub struct RealSensorSource {
    driver: Box<dyn EcgDriver>,
    pipeline: EcgPipeline,
    channel: String,
    idle_tick: Duration,
    state: SensorState,
    stats: SharedSessionStats,
}

impl RealSensorSource {
    /// Source with a pipeline sized from `config`.
    pub fn new(driver: Box<dyn EcgDriver>, config: &Config, stats: SharedSessionStats) -> Self {
        Self::with_pipeline(
            driver,
            EcgPipeline::new(config, stats.clone()),
            config.ecg_channel(),
            stats,
        )
    }

    /// Source with a prebuilt pipeline subscribed to `channel`.
    pub fn with_pipeline(
        driver: Box<dyn EcgDriver>,
        pipeline: EcgPipeline,
        channel: String,
        stats: SharedSessionStats,
    ) -> Self {
        Self {
            driver,
            pipeline,
            channel,
            idle_tick: IDLE_TICK,
            state: SensorState::Disconnected,
            stats,
        }
    }

    /// Set how often the stream loop wakes when no frames arrive.
    pub fn with_idle_tick(mut self, idle_tick: Duration) -> Self {
        self.idle_tick = idle_tick;
        self
    }

    /// Get the connection state.
    pub fn state(&self) -> SensorState {
        self.state
    }

    /// Get the pipeline.
    pub fn pipeline(&self) -> &EcgPipeline {
        &self.pipeline
    }

    /// Stream until shutdown is requested or the driver fails.
    pub async fn run<S: MetricSink>(
        &mut self,
        sink: &mut S,
        shutdown: &Shutdown,
    ) -> Result<(), SourceError> {
        self.state = SensorState::Discovering;
        tracing::info!("searching for ECG devices");

        let devices = match self.driver.detect_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                self.state = SensorState::Disconnected;
                return Err(e.into());
            }
        };
        let Some(device) = devices.into_iter().next() else {
            self.state = SensorState::Disconnected;
            return Err(SourceError::NoDevice);
        };
        tracing::info!(device = %device.identifier, address = %device.address, "connecting");

        let (callback, mut frames) = forwarding_callback();
        let mut handle = match self.driver.connect(device.clone(), callback).await {
            Ok(handle) => handle,
            Err(e) => {
                self.state = SensorState::Disconnected;
                return Err(e.into());
            }
        };
        self.state = SensorState::Connected;

        let result = self
            .stream(handle.as_mut(), &mut frames, sink, shutdown)
            .await;

        self.state = SensorState::Stopping;
        if let Err(e) = handle.unsubscribe_all().await {
            tracing::warn!(device = %device.identifier, error = %e, "unsubscribe failed");
        }
        if let Err(e) = handle.stop().await {
            tracing::warn!(device = %device.identifier, error = %e, "device stop failed");
        }
        self.state = SensorState::Disconnected;
        tracing::info!(device = %device.identifier, "disconnected");

        result
    }

    async fn stream<S: MetricSink>(
        &mut self,
        device: &mut dyn EcgDevice,
        frames: &mut UnboundedReceiver<EcgFrame>,
        sink: &mut S,
        shutdown: &Shutdown,
    ) -> Result<(), SourceError> {
        device.start().await?;
        device.subscribe(&self.channel).await?;
        self.state = SensorState::Streaming;
        tracing::info!(channel = %self.channel, "streaming");

        let mut idle = tokio::time::interval(self.idle_tick);
        idle.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !shutdown.is_requested() {
            tokio::select! {
                frame = frames.recv() => {
                    let Some(frame) = frame else {
                        return Err(SourceError::StreamClosed);
                    };
                    self.stats.record_frame(frame.len());
                    self.pipeline.ingest(&frame.samples, sink);
                }
                _ = idle.tick() => {}
            }
        }
        Ok(())
    }
}

/// Callback that forwards non-empty frames to the streaming task.
fn forwarding_callback() -> (FrameCallback, UnboundedReceiver<EcgFrame>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: FrameCallback = Arc::new(move |_: &DeviceInfo, frame: EcgFrame| {
        if frame.is_empty() {
            return;
        }
        // Receiver gone means the source is shutting down
        let _ = tx.send(frame);
    });
    (callback, rx)
}
