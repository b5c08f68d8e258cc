//! Input sources for the ECG bridge.
//!
//! Exactly one source drives a run, chosen once at startup:
//! - [`RealSensorSource`]: frames from a sensor driver, through the pipeline
//! - [`SimulatedClickSource`]: a metric synthesised from trigger-key density
//!
//! Both publish through the same [`MetricSink`](crate::output::MetricSink).

pub mod clicks;
pub mod driver;
pub mod real;
pub mod replay;
pub mod stream;
pub mod synthetic;
pub mod trigger;
pub mod types;

pub use clicks::{click_metric, ClickHistory, SimulatedClickSource};
pub use driver::{open_driver, DriverError, DriverSelection, EcgDevice, EcgDriver, FrameCallback};
pub use real::{RealSensorSource, SensorState};
pub use replay::ReplayDriver;
pub use synthetic::{synthesize_ecg, EcgSynthesizer, SyntheticEcgDriver, SyntheticParams};
pub use trigger::{ChannelTrigger, NoopTrigger, TerminalTrigger, TriggerKey};
pub use types::{DeviceInfo, EcgFrame, SensorMetadata};

use crate::config::Config;
use crate::output::MetricSink;
use crate::session::SharedSessionStats;
use crate::shutdown::Shutdown;
use thiserror::Error;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("no ECG device found")]
    NoDevice,
    #[error("driver stopped delivering frames")]
    StreamClosed,
}

/// Which source the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Sensor,
    Simulation,
}

/// Trigger type used by the binary's click simulator.
pub type BoxedTrigger = Box<dyn TriggerKey + Send>;

/// The source selected for this run.
pub enum InputSource {
    RealSensor(Box<RealSensorSource>),
    SimulatedClicks(SimulatedClickSource<BoxedTrigger>),
}

impl InputSource {
    /// Build the source for `mode`.
    ///
    /// Sensor mode falls back to the click simulator when the driver is
    /// unavailable. Any other driver error is returned. `open_trigger` is only
    /// called when the simulator is chosen.
    pub fn select<F>(
        mode: SourceMode,
        selection: &DriverSelection,
        config: &Config,
        stats: &SharedSessionStats,
        open_trigger: F,
    ) -> Result<Self, SourceError>
    where
        F: FnOnce() -> BoxedTrigger,
    {
        if mode == SourceMode::Sensor {
            match open_driver(selection, config) {
                Ok(driver) => {
                    let source = RealSensorSource::new(driver, config, stats.clone());
                    return Ok(InputSource::RealSensor(Box::new(source)));
                }
                Err(DriverError::Unavailable(reason)) => {
                    tracing::warn!(%reason, "sensor driver unavailable, using simulation");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let source = SimulatedClickSource::new(config, open_trigger(), stats.clone());
        Ok(InputSource::SimulatedClicks(source))
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            InputSource::RealSensor(_) => "sensor",
            InputSource::SimulatedClicks(_) => "simulation",
        }
    }

    /// Drive the source until shutdown or a fatal error.
    pub async fn run<S: MetricSink>(
        &mut self,
        sink: &mut S,
        shutdown: &Shutdown,
    ) -> Result<(), SourceError> {
        match self {
            InputSource::RealSensor(source) => source.run(sink, shutdown).await,
            InputSource::SimulatedClicks(source) => {
                source.run(sink, shutdown).await;
                Ok(())
            }
        }
    }
}
