//! Sensor driver collaborator contract.
//!
//! A driver discovers devices and connects to one of them. A connected device
//! pushes frames to the callback it was built with, from whatever thread or
//! task the driver uses internally; the pipeline never polls it.

use crate::config::Config;
use crate::source::replay::ReplayDriver;
use crate::source::synthetic::{SyntheticEcgDriver, SyntheticParams};
use crate::source::types::{DeviceInfo, EcgFrame};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Invoked by a device whenever a frame is ready.
pub type FrameCallback = Arc<dyn Fn(&DeviceInfo, EcgFrame) + Send + Sync>;

/// Errors reported by drivers and devices.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver cannot be used at all on this machine.
    #[error("driver unavailable: {0}")]
    Unavailable(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("cannot subscribe to {channel}: {reason}")]
    Subscription { channel: String, reason: String },
    #[error("device is not connected")]
    NotConnected,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Device discovery and connection.
#[async_trait]
pub trait EcgDriver: Send {
    /// Scan for reachable devices.
    async fn detect_devices(&mut self) -> Result<Vec<DeviceInfo>, DriverError>;

    /// Build a device handle that will deliver frames to `callback`.
    async fn connect(
        &mut self,
        device: DeviceInfo,
        callback: FrameCallback,
    ) -> Result<Box<dyn EcgDevice>, DriverError>;
}

/// A connected device.
#[async_trait]
pub trait EcgDevice: Send {
    async fn start(&mut self) -> Result<(), DriverError>;
    async fn subscribe(&mut self, channel: &str) -> Result<(), DriverError>;
    async fn unsubscribe_all(&mut self) -> Result<(), DriverError>;
    async fn stop(&mut self) -> Result<(), DriverError>;
}

/// Which built-in driver to use on the sensor path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverSelection {
    /// Generated ECG with realistic morphology.
    Synthetic,
    /// A recorded sample file played back in real time.
    Replay(PathBuf),
}

/// Instantiate the selected driver.
///
/// [`DriverError::Unavailable`] means the capability is missing and the
/// caller should fall back to the click simulator.
pub fn open_driver(
    selection: &DriverSelection,
    config: &Config,
) -> Result<Box<dyn EcgDriver>, DriverError> {
    let driver: Box<dyn EcgDriver> = match selection {
        DriverSelection::Synthetic => Box::new(SyntheticEcgDriver::new(SyntheticParams::default())),
        DriverSelection::Replay(path) => {
            let replay = ReplayDriver::open(path, config.sampling_rate_hz)?;
            Box::new(replay)
        }
    };
    Ok(driver)
}
