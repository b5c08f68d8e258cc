//! Throttled analysis scheduling.
//!
//! Extraction costs tens to hundreds of milliseconds while frames arrive every
//! few tens of milliseconds, so analyses are gated to at most one per
//! `min_interval`.

use std::time::{Duration, Instant};

/// Outcome of a scheduling check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// Fewer than `window_size` samples are buffered.
    InsufficientData,
    /// The previous analysis was too recent.
    Throttled,
    /// Run the extractor now; the clock has already been advanced.
    Analyze,
}

/// Decides, on every ingest, whether to run the extractor.
#[derive(Debug, Clone)]
pub struct AnalysisScheduler {
    window_size: usize,
    min_interval: Duration,
    last_analysis: Option<Instant>,
}

impl AnalysisScheduler {
    /// Create a scheduler that has never run an analysis.
    pub fn new(window_size: usize, min_interval: Duration) -> Self {
        Self {
            window_size,
            min_interval,
            last_analysis: None,
        }
    }

    /// Check the gate against the current buffer length.
    ///
    /// When the answer is [`ScheduleDecision::Analyze`] the analysis clock is
    /// set to `now`, whether or not the extraction that follows succeeds.
    pub fn check(&mut self, buffered: usize, now: Instant) -> ScheduleDecision {
        if buffered < self.window_size {
            return ScheduleDecision::InsufficientData;
        }

        if let Some(last) = self.last_analysis {
            if now.saturating_duration_since(last) < self.min_interval {
                return ScheduleDecision::Throttled;
            }
        }

        self.last_analysis = Some(now);
        ScheduleDecision::Analyze
    }

    /// Samples required before the first analysis.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Minimum spacing between two analyses.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// When the last analysis was attempted.
    pub fn last_analysis(&self) -> Option<Instant> {
        self.last_analysis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_full_window_runs_immediately() {
        let mut scheduler = AnalysisScheduler::new(2500, Duration::from_secs(1));
        let now = Instant::now();

        assert_eq!(
            scheduler.check(2499, now),
            ScheduleDecision::InsufficientData
        );
        assert!(scheduler.last_analysis().is_none());
        assert_eq!(scheduler.check(2500, now), ScheduleDecision::Analyze);
        assert_eq!(scheduler.last_analysis(), Some(now));
    }

    #[test]
    fn test_throttle_gate() {
        let mut scheduler = AnalysisScheduler::new(10, Duration::from_secs(1));
        let t0 = Instant::now();

        assert_eq!(scheduler.check(10, t0), ScheduleDecision::Analyze);
        assert_eq!(
            scheduler.check(10, t0 + Duration::from_millis(40)),
            ScheduleDecision::Throttled
        );
        assert_eq!(
            scheduler.check(10, t0 + Duration::from_millis(999)),
            ScheduleDecision::Throttled
        );
        assert_eq!(
            scheduler.check(10, t0 + Duration::from_millis(1000)),
            ScheduleDecision::Analyze
        );
        assert_eq!(
            scheduler.last_analysis(),
            Some(t0 + Duration::from_secs(1))
        );
    }

    #[test]
    fn test_insufficient_data_does_not_touch_clock() {
        let mut scheduler = AnalysisScheduler::new(10, Duration::from_secs(1));
        let t0 = Instant::now();

        assert_eq!(scheduler.check(10, t0), ScheduleDecision::Analyze);
        // Buffer shrank below the window (e.g. reconfigured source)
        assert_eq!(
            scheduler.check(3, t0 + Duration::from_secs(5)),
            ScheduleDecision::InsufficientData
        );
        assert_eq!(scheduler.last_analysis(), Some(t0));
    }

    #[test]
    fn test_attempts_are_spaced_by_interval() {
        let interval = Duration::from_secs(1);
        let mut scheduler = AnalysisScheduler::new(1, interval);
        let t0 = Instant::now();

        let mut attempts = Vec::new();
        for step in 0..200u64 {
            let now = t0 + Duration::from_millis(step * 37);
            if scheduler.check(1, now) == ScheduleDecision::Analyze {
                attempts.push(now);
            }
        }

        assert!(attempts.len() > 1);
        for pair in attempts.windows(2) {
            assert!(pair[1] - pair[0] >= interval);
        }
    }
}
