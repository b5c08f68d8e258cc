//! Configuration for the Synheart ECG Bridge.
//!
//! Every tunable is fixed for the lifetime of the process: the file is read
//! once at startup and never reloaded.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main configuration for the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ECG sampling rate in Hz
    pub sampling_rate_hz: u32,

    /// Seconds of samples kept before the buffer is trimmed
    pub retention_secs: u32,

    /// Seconds of samples kept after a trim
    pub trim_secs: u32,

    /// Seconds of samples handed to the extractor per analysis
    pub analysis_window_secs: u32,

    /// Minimum time between two analyses
    #[serde(with = "duration_millis")]
    pub analysis_interval: Duration,

    /// Trailing window over which simulated clicks are counted
    #[serde(with = "duration_millis")]
    pub click_window: Duration,

    /// Minimum spacing between two registered clicks
    #[serde(with = "duration_millis")]
    pub click_debounce: Duration,

    /// Cadence of the click simulator loop
    #[serde(with = "duration_millis")]
    pub simulation_tick: Duration,

    /// Lower clamp for the simulated metric (ms)
    pub metric_floor: f64,

    /// Upper clamp for the simulated metric (ms)
    pub metric_ceiling: f64,

    /// Half-width of the uniform noise added to the simulated metric
    pub noise_amplitude: f64,

    /// Where metrics are sent
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 250,
            retention_secs: 20,
            trim_secs: 10,
            analysis_window_secs: 10,
            analysis_interval: Duration::from_secs(1),
            click_window: Duration::from_secs(5),
            click_debounce: Duration::from_millis(100),
            simulation_tick: Duration::from_millis(50),
            metric_floor: 10.0,
            metric_ceiling: 100.0,
            noise_amplitude: 1.5,
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, falling back to defaults
    /// when the file does not exist.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-ecg-bridge")
            .join("config.json")
    }

    /// Reject combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling_rate_hz == 0 {
            return invalid("sampling rate must be positive");
        }
        if self.trim_secs == 0 || self.trim_secs >= self.retention_secs {
            return Err(ConfigError::Invalid(format!(
                "trim target ({}s) must be positive and below retention ({}s)",
                self.trim_secs, self.retention_secs
            )));
        }
        if self.analysis_window_secs == 0 || self.analysis_window_secs > self.retention_secs {
            return Err(ConfigError::Invalid(format!(
                "analysis window ({}s) must be positive and fit in retention ({}s)",
                self.analysis_window_secs, self.retention_secs
            )));
        }
        if self.sampling_rate_hz.checked_mul(self.retention_secs).is_none() {
            return Err(ConfigError::Invalid(format!(
                "{} Hz over {}s overflows the sample count",
                self.sampling_rate_hz, self.retention_secs
            )));
        }
        if self.metric_floor > self.metric_ceiling {
            return Err(ConfigError::Invalid(format!(
                "metric floor {} exceeds ceiling {}",
                self.metric_floor, self.metric_ceiling
            )));
        }
        if self.noise_amplitude.is_nan() || self.noise_amplitude < 0.0 {
            return invalid("noise amplitude must be non-negative");
        }
        if self.simulation_tick.is_zero() {
            return invalid("simulation tick must be positive");
        }
        Ok(())
    }

    /// Hard cap on buffered samples.
    pub fn retention_limit(&self) -> usize {
        samples(self.sampling_rate_hz, self.retention_secs)
    }

    /// Number of samples kept after a trim.
    pub fn trim_target(&self) -> usize {
        samples(self.sampling_rate_hz, self.trim_secs)
    }

    /// Number of samples in one analysis window.
    pub fn window_size(&self) -> usize {
        samples(self.sampling_rate_hz, self.analysis_window_secs)
    }

    /// Sensor channel to subscribe to, e.g. `/Meas/ECG/250`.
    pub fn ecg_channel(&self) -> String {
        format!("/Meas/ECG/{}", self.sampling_rate_hz)
    }
}

fn samples(rate_hz: u32, secs: u32) -> usize {
    (rate_hz as usize).saturating_mul(secs as usize)
}

fn invalid(reason: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(reason.to_string()))
}

/// Destination of the datagram channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub host: String,
    pub port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5005,
        }
    }
}

impl OutputConfig {
    /// `host:port` form accepted by socket APIs.
    pub fn destination(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
