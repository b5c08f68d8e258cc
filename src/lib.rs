//! Synheart ECG Bridge - live HRV from ECG, republished over UDP.
//!
//! The bridge reads a single-lead ECG stream, keeps the most recent samples
//! in a bounded buffer, periodically derives RMSSD from a fixed-length window
//! and sends each value as a UTF-8 datagram to a local consumer. When no
//! sensor is available, a click simulator produces values on the same scale
//! from how often the space bar is hit.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Synheart ECG Bridge                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐            │
//! │  │   Driver   │──▶│   Buffer   │──▶│ Scheduler  │            │
//! │  │ (callback) │   │ (20s → 10s)│   │  (≥ 1 s)   │            │
//! │  └────────────┘   └────────────┘   └─────┬──────┘            │
//! │                                          ▼                   │
//! │  ┌────────────┐                   ┌────────────┐             │
//! │  │   Click    │──────────────────▶│ Publisher  │──▶ UDP      │
//! │  │ Simulator  │                   │ (+ gauge)  │             │
//! │  └────────────┘                   └────────────┘             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use synheart_ecg_bridge::{create_shared_stats, Config, MetricPublisher, UdpChannel};
//!
//! let config = Config::default();
//! let stats = create_shared_stats();
//! let channel = UdpChannel::open(&config.output).expect("Failed to open socket");
//! let publisher = MetricPublisher::new(channel, stats);
//! ```

pub mod config;
pub mod core;
pub mod output;
pub mod session;
pub mod shutdown;
pub mod source;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, OutputConfig};
pub use core::{EcgHrvExtractor, EcgPipeline, Extraction, FeatureExtractor, IngestOutcome};
pub use output::{MetricPublisher, MetricReading, MetricSink, StressState, UdpChannel};
pub use session::{create_shared_stats, SessionStats, SharedSessionStats};
pub use shutdown::Shutdown;
pub use source::{InputSource, SourceError, SourceMode};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Printed when the bridge starts on a sensor.
pub const SENSOR_BANNER: &str = "🔵 Starting in SENSOR mode...";

/// Printed when the click simulator starts.
pub const SIMULATION_BANNER: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              SYNHEART ECG BRIDGE - CLICK SIMULATION              ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  No sensor in use. RMSSD values are simulated from the keyboard. ║
║                                                                  ║
║    • Spam or hold SPACE to simulate STRESS                       ║
║    • Do nothing to simulate ZEN                                  ║
║    • Press Ctrl+C to stop                                        ║
║                                                                  ║
║  Consumers receive the same payload as in sensor mode.           ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_banner_contents() {
        assert!(SIMULATION_BANNER.contains("SPACE"));
        assert!(SIMULATION_BANNER.contains("STRESS"));
        assert!(SIMULATION_BANNER.contains("ZEN"));
    }
}
