//! Session bookkeeping for the ECG bridge.

pub mod stats;

pub use stats::{create_shared_stats, SessionStats, SharedSessionStats, StatsSnapshot};
