//! Console gauge rendering.

use std::fmt;

/// Metrics above this value read as relaxed.
pub const ZEN_THRESHOLD: f64 = 40.0;

/// Metric units per bar character.
const BAR_UNIT: f64 = 5.0;

/// Binary interpretation of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressState {
    Zen,
    Stress,
}

impl StressState {
    /// Classify a metric against the zen threshold.
    pub fn from_metric(metric: f64) -> Self {
        if metric > ZEN_THRESHOLD {
            StressState::Zen
        } else {
            StressState::Stress
        }
    }

    /// Get the display label.
    pub fn label(self) -> &'static str {
        match self {
            StressState::Zen => "ZEN",
            StressState::Stress => "STRESS",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            StressState::Zen => "🟢",
            StressState::Stress => "🔴",
        }
    }
}

impl fmt::Display for StressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.marker(), self.label())
    }
}

/// A bar of `floor(metric / 5)` blocks; empty for non-positive metrics.
pub fn bar(metric: f64) -> String {
    let len = (metric / BAR_UNIT).floor();
    if len.is_finite() && len > 0.0 {
        "█".repeat(len as usize)
    } else {
        String::new()
    }
}

/// One line per metric on the sensor path.
pub fn sensor_line(metric: f64) -> String {
    format!(
        "UDP -> {metric:.2} ms | {} | {}",
        StressState::from_metric(metric),
        bar(metric)
    )
}

/// The continuously overwritten status line of the click simulator.
pub fn click_line(clicks: usize, metric: f64) -> String {
    format!(
        "Clicks: {clicks} | RMSSD: {metric:.2} ms | {} | {}   ",
        StressState::from_metric(metric),
        bar(metric)
    )
}
