//! Integration tests for the buffered ECG analysis pipeline

use std::time::{Duration, Instant};
use synheart_ecg_bridge::core::{EcgPipeline, IngestOutcome};
use synheart_ecg_bridge::output::{MetricReading, MetricSink, ReadingOrigin};
use synheart_ecg_bridge::source::{synthesize_ecg, SyntheticParams};
use synheart_ecg_bridge::{create_shared_stats, Config};

#[derive(Default)]
struct Recorder {
    readings: Vec<MetricReading>,
}

impl MetricSink for Recorder {
    fn publish(&mut self, reading: &MetricReading) {
        self.readings.push(*reading);
    }
}

#[test]
fn test_clean_ecg_window_yields_plausible_rmssd() {
    let config = Config::default();
    let stats = create_shared_stats();
    let mut pipeline = EcgPipeline::new(&config, stats.clone());
    let mut sink = Recorder::default();

    let ecg = synthesize_ecg(SyntheticParams::default(), 250, 10.0, 42);
    assert_eq!(ecg.len(), 2500);

    let outcome = pipeline.ingest_at(&ecg, Instant::now(), &mut sink);

    let IngestOutcome::Published(value) = outcome else {
        panic!("expected a published metric, got {outcome:?}");
    };
    assert!(value.is_finite());
    assert!((0.0..=200.0).contains(&value), "rmssd {value} out of range");
    assert_eq!(sink.readings.len(), 1);
    assert_eq!(sink.readings[0].origin, ReadingOrigin::Sensor);
    assert_eq!(stats.snapshot().analyses_attempted, 1);
}

#[test]
fn test_short_noise_is_never_analyzed() {
    let config = Config::default();
    let stats = create_shared_stats();
    let mut pipeline = EcgPipeline::new(&config, stats.clone());
    let mut sink = Recorder::default();

    let noise: Vec<f64> = (0..100)
        .map(|i| ((i * 7919) % 13) as f64 / 13.0 - 0.5)
        .collect();
    let outcome = pipeline.ingest_at(&noise, Instant::now(), &mut sink);

    assert_eq!(outcome, IngestOutcome::Buffering);
    assert!(sink.readings.is_empty());
    assert_eq!(stats.snapshot().analyses_attempted, 0);
    assert_eq!(pipeline.buffer().len(), 100);
}

#[test]
fn test_flat_window_fails_without_publishing() {
    let config = Config::default();
    let stats = create_shared_stats();
    let mut pipeline = EcgPipeline::new(&config, stats.clone());
    let mut sink = Recorder::default();

    let outcome = pipeline.ingest_at(&[0.0; 2500], Instant::now(), &mut sink);

    assert_eq!(outcome, IngestOutcome::Skipped);
    assert!(sink.readings.is_empty());
    let snap = stats.snapshot();
    assert_eq!(snap.analyses_attempted, 1);
    assert_eq!(snap.extraction_failures, 1);
}

#[test]
fn test_streaming_keeps_buffer_bounded_and_throttled() {
    let config = Config::default();
    let stats = create_shared_stats();
    let mut pipeline = EcgPipeline::new(&config, stats.clone());
    let mut sink = Recorder::default();

    // 30 s of signal in 40 ms frames
    let ecg = synthesize_ecg(SyntheticParams::default(), 250, 30.0, 9);
    let t0 = Instant::now();

    for (i, frame) in ecg.chunks(10).enumerate() {
        let now = t0 + Duration::from_millis(i as u64 * 40);
        let before = pipeline.buffer().as_slice().to_vec();
        pipeline.ingest_at(frame, now, &mut sink);

        let buffer = pipeline.buffer();
        assert!(buffer.len() <= config.retention_limit());
        if before.len() + frame.len() > config.retention_limit() {
            // Trimmed to the newest samples, order preserved
            assert_eq!(buffer.len(), config.trim_target());
            let mut expected = before;
            expected.extend_from_slice(frame);
            let newest = &expected[expected.len() - config.trim_target()..];
            assert_eq!(buffer.as_slice(), newest);
        }
    }

    // Analysis starts once 10 s are buffered, then at most once per second
    let attempts = stats.snapshot().analyses_attempted;
    assert!((19..=21).contains(&attempts), "attempts: {attempts}");
}

#[test]
fn test_pure_sine_window_publishes_metric() {
    let config = Config::default();
    let stats = create_shared_stats();
    let mut pipeline = EcgPipeline::new(&config, stats.clone());
    let mut sink = Recorder::default();

    // 72 bpm sine, 10 s at 250 Hz
    let sine: Vec<f64> = (0..2500)
        .map(|i| (2.0 * std::f64::consts::PI * 1.2 * i as f64 / 250.0).sin())
        .collect();

    let outcome = pipeline.ingest_at(&sine, Instant::now(), &mut sink);

    let IngestOutcome::Published(value) = outcome else {
        panic!("expected a published metric, got {outcome:?}");
    };
    assert!((0.0..=200.0).contains(&value), "rmssd {value} out of range");
    assert_eq!(sink.readings.len(), 1);
    assert_eq!(stats.snapshot().extraction_failures, 0);
}
