//! In-memory session statistics.
//!
//! Counters are updated from the single pipeline task and read by the CLI
//! when it prints the end-of-session summary. Nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Counters for the current run.
#[derive(Debug)]
pub struct SessionStats {
    /// Unique identifier for this run
    session_id: Uuid,
    /// Non-empty frames received from a driver
    frames_received: AtomicU64,
    /// Samples appended to the buffer
    samples_ingested: AtomicU64,
    /// Extractor invocations
    analyses_attempted: AtomicU64,
    /// Extractor invocations that produced no metric
    extraction_failures: AtomicU64,
    /// Metrics handed to the publisher
    metrics_published: AtomicU64,
    /// Datagram sends that failed
    send_failures: AtomicU64,
    /// Simulated clicks that survived debouncing
    clicks_registered: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl SessionStats {
    /// Create new session statistics.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            frames_received: AtomicU64::new(0),
            samples_ingested: AtomicU64::new(0),
            analyses_attempted: AtomicU64::new(0),
            extraction_failures: AtomicU64::new(0),
            metrics_published: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            clicks_registered: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Get the session ID.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Record one non-empty frame of `samples` samples.
    pub fn record_frame(&self, samples: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.samples_ingested
            .fetch_add(samples as u64, Ordering::Relaxed);
    }

    /// Record one analysis attempt.
    pub fn record_analysis(&self, succeeded: bool) {
        self.analyses_attempted.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.extraction_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a metric sent.
    pub fn record_published(&self) {
        self.metrics_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed send.
    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a registered click.
    pub fn record_click(&self) {
        self.clicks_registered.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            session_id: self.session_id,
            frames_received: self.frames_received.load(Ordering::Relaxed),
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            analyses_attempted: self.analyses_attempted.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            metrics_published: self.metrics_published.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            clicks_registered: self.clicks_registered.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session {}:\n\
             - Frames received: {}\n\
             - Samples ingested: {}\n\
             - Analyses attempted: {} ({} failed)\n\
             - Clicks registered: {}\n\
             - Metrics published: {} ({} send failures)\n\
             - Session duration: {} seconds",
            stats.session_id,
            stats.frames_received,
            stats.samples_ingested,
            stats.analyses_attempted,
            stats.extraction_failures,
            stats.clicks_registered,
            stats.metrics_published,
            stats.send_failures,
            stats.session_duration_secs
        )
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub session_id: Uuid,
    pub frames_received: u64,
    pub samples_ingested: u64,
    pub analyses_attempted: u64,
    pub extraction_failures: u64,
    pub metrics_published: u64,
    pub send_failures: u64,
    pub clicks_registered: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Shared handle to the session counters.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create a new shared statistics handle.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}
