//! The streaming windowed feature pipeline.
//!
//! One [`EcgPipeline`] owns the sample buffer, the analysis clock and the
//! extractor. Every ingest appends, trims, then asks the scheduler whether an
//! analysis is due. Extraction runs synchronously on the calling task, so a
//! slow extractor stalls ingestion for its full duration; the throttle bounds
//! how often that can happen.

use crate::config::Config;
use crate::core::buffer::{Sample, SampleBuffer};
use crate::core::extractor::{extract, EcgHrvExtractor, Extraction, FeatureExtractor};
use crate::core::scheduler::{AnalysisScheduler, ScheduleDecision};
use crate::output::{MetricReading, MetricSink};
use crate::session::SharedSessionStats;
use std::time::Instant;

/// What happened to the analysis stage during one ingest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestOutcome {
    /// Window not full yet.
    Buffering,
    /// Analysis ran too recently.
    Throttled,
    /// Extraction failed; nothing was published.
    Skipped,
    /// A metric was published.
    Published(f64),
}

/// Buffer, scheduler and extractor wired together.
pub struct EcgPipeline {
    buffer: SampleBuffer,
    scheduler: AnalysisScheduler,
    extractor: Box<dyn FeatureExtractor>,
    sampling_rate_hz: u32,
    stats: SharedSessionStats,
}

impl EcgPipeline {
    /// Pipeline with the default ECG extractor, sized from `config`.
    pub fn new(config: &Config, stats: SharedSessionStats) -> Self {
        Self::with_extractor(config, Box::new(EcgHrvExtractor), stats)
    }

    /// Pipeline with a caller-supplied extractor.
    pub fn with_extractor(
        config: &Config,
        extractor: Box<dyn FeatureExtractor>,
        stats: SharedSessionStats,
    ) -> Self {
        Self {
            buffer: SampleBuffer::new(config.retention_limit(), config.trim_target()),
            scheduler: AnalysisScheduler::new(config.window_size(), config.analysis_interval),
            extractor,
            sampling_rate_hz: config.sampling_rate_hz,
            stats,
        }
    }

    /// Ingest a batch using the current wall-clock time.
    pub fn ingest<S: MetricSink>(&mut self, batch: &[Sample], sink: &mut S) -> IngestOutcome {
        self.ingest_at(batch, Instant::now(), sink)
    }

    /// Ingest a batch as if it arrived at `now`.
    pub fn ingest_at<S: MetricSink>(
        &mut self,
        batch: &[Sample],
        now: Instant,
        sink: &mut S,
    ) -> IngestOutcome {
        self.buffer.ingest(batch);

        match self.scheduler.check(self.buffer.len(), now) {
            ScheduleDecision::InsufficientData => IngestOutcome::Buffering,
            ScheduleDecision::Throttled => IngestOutcome::Throttled,
            ScheduleDecision::Analyze => self.analyze(sink),
        }
    }

    fn analyze<S: MetricSink>(&mut self, sink: &mut S) -> IngestOutcome {
        let Some(window) = self.buffer.latest(self.scheduler.window_size()) else {
            return IngestOutcome::Buffering;
        };

        let started = Instant::now();
        let extractor = self.extractor.as_ref();
        let outcome = extract(extractor, window, self.sampling_rate_hz);
        let elapsed = started.elapsed();
        if elapsed > self.scheduler.min_interval() {
            tracing::warn!(?elapsed, "extraction took longer than the analysis interval");
        }

        match outcome {
            Extraction::Metric(value) => {
                self.stats.record_analysis(true);
                tracing::debug!(rmssd = value, ?elapsed, "analysis complete");
                sink.publish(&MetricReading::sensor(value));
                IngestOutcome::Published(value)
            }
            Extraction::Failed => {
                self.stats.record_analysis(false);
                IngestOutcome::Skipped
            }
        }
    }

    /// Get the sample buffer.
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
}
