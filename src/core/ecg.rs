//! ECG cleaning, R-peak detection and time-domain HRV.
//!
//! The processing chain mirrors a conventional single-lead pipeline:
//! detrend and high-pass to remove baseline wander, notch out mains hum,
//! pick R peaks as refractory-spaced local maxima above an adaptive
//! threshold, then derive RMSSD from the RR series.

use biquad::{
    Biquad, Coefficients, DirectForm2Transposed, Hertz, ToHertz, Type, Q_BUTTERWORTH_F64,
};
use statrs::statistics::Statistics;
use thiserror::Error;

/// Cut-off of the baseline-wander high-pass filter.
const HIGHPASS_HZ: f64 = 0.5;

/// Mains frequency removed by the notch filter.
const POWERLINE_HZ: f64 = 50.0;

/// Quality factor of the mains notch.
const POWERLINE_Q: f64 = 30.0;

/// Minimum spacing between two R peaks (200 bpm).
const REFRACTORY_SECS: f64 = 0.3;

/// Peak threshold, in standard deviations above the mean.
const PEAK_THRESHOLD_STD: f64 = 2.0;

/// Upper bound on the peak threshold, as a fraction of the distance from the
/// mean to the maximum. Smooth waveforms never reach 2 standard deviations.
const PEAK_THRESHOLD_RANGE: f64 = 0.5;

/// Shortest window the chain will attempt.
const MIN_WINDOW_SECS: f64 = 1.0;

/// Errors raised by the individual processing stages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("window of {len} samples is shorter than {min} samples")]
    WindowTooShort { len: usize, min: usize },
    #[error("invalid sampling rate {0} Hz")]
    InvalidSamplingRate(u32),
    #[error("filter design failed: {0}")]
    Filter(String),
    #[error("window contains non-finite samples")]
    NonFinite,
    #[error("found {0} peaks, need at least 2")]
    TooFewPeaks(usize),
}

/// Remove baseline wander and mains interference from a raw window.
pub fn clean(window: &[f64], sampling_rate_hz: u32) -> Result<Vec<f64>, ExtractionError> {
    if sampling_rate_hz == 0 {
        return Err(ExtractionError::InvalidSamplingRate(sampling_rate_hz));
    }
    let min = (MIN_WINDOW_SECS * sampling_rate_hz as f64) as usize;
    if window.len() < min {
        return Err(ExtractionError::WindowTooShort {
            len: window.len(),
            min,
        });
    }
    if window.iter().any(|x| !x.is_finite()) {
        return Err(ExtractionError::NonFinite);
    }

    let fs = (sampling_rate_hz as f64).hz();
    let highpass = design(Type::HighPass, fs, HIGHPASS_HZ, Q_BUTTERWORTH_F64)?;

    // Two cascaded second-order sections give a fourth-order roll-off.
    let mut stages = vec![
        DirectForm2Transposed::<f64>::new(highpass),
        DirectForm2Transposed::<f64>::new(highpass),
    ];

    if POWERLINE_HZ < sampling_rate_hz as f64 / 2.0 {
        let notch = design(Type::Notch, fs, POWERLINE_HZ, POWERLINE_Q)?;
        stages.push(DirectForm2Transposed::<f64>::new(notch));
    }

    // Starting from zero mean keeps the high-pass start-up transient small.
    let mean = window.iter().mean();

    Ok(window
        .iter()
        .map(|&x| {
            stages
                .iter_mut()
                .fold(x - mean, |acc, stage| stage.run(acc))
        })
        .collect())
}

fn design(
    filter: Type<f64>,
    fs: Hertz<f64>,
    f0: f64,
    q: f64,
) -> Result<Coefficients<f64>, ExtractionError> {
    Coefficients::<f64>::from_params(filter, fs, f0.hz(), q)
        .map_err(|e| ExtractionError::Filter(format!("{f0} Hz section: {e:?}")))
}

/// Locate R peaks in a cleaned signal.
///
/// A peak is a local maximum above `mean + 2σ`, or above the midpoint between
/// the mean and the maximum when that is lower. Returns sample indices in
/// ascending order.
pub fn detect_peaks(cleaned: &[f64], sampling_rate_hz: u32) -> Vec<usize> {
    if cleaned.len() < 3 {
        return Vec::new();
    }

    let mean = cleaned.iter().mean();
    let std = cleaned.iter().std_dev();
    if !std.is_finite() || std <= f64::EPSILON {
        return Vec::new();
    }
    let max = cleaned.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range_gate = PEAK_THRESHOLD_RANGE * (max - mean);
    let threshold = mean + (PEAK_THRESHOLD_STD * std).min(range_gate);
    let refractory = (REFRACTORY_SECS * sampling_rate_hz as f64).round() as usize;
    let refractory = refractory.max(1);

    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..cleaned.len() - 1 {
        let x = cleaned[i];
        if x <= threshold || x < cleaned[i - 1] || x < cleaned[i + 1] {
            continue;
        }
        if let Some(&last) = peaks.last() {
            if i - last < refractory {
                // Keep the taller of two candidates inside one refractory span
                if x > cleaned[last] {
                    if let Some(slot) = peaks.last_mut() {
                        *slot = i;
                    }
                }
                continue;
            }
        }
        peaks.push(i);
    }

    peaks
}

/// Successive peak-to-peak intervals in milliseconds.
pub fn rr_intervals_ms(peaks: &[usize], sampling_rate_hz: u32) -> Vec<f64> {
    peaks
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) as f64 * 1000.0 / sampling_rate_hz as f64)
        .collect()
}

/// Root mean square of successive RR differences.
///
/// Returns NaN when fewer than two intervals are available.
pub fn rmssd(rr_ms: &[f64]) -> f64 {
    rr_ms
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).powi(2))
        .mean()
        .sqrt()
}

/// Run the full chain on one window.
pub fn hrv_rmssd(window: &[f64], sampling_rate_hz: u32) -> Result<f64, ExtractionError> {
    let cleaned = clean(window, sampling_rate_hz)?;
    let peaks = detect_peaks(&cleaned, sampling_rate_hz);
    if peaks.len() < 2 {
        return Err(ExtractionError::TooFewPeaks(peaks.len()));
    }
    let rr = rr_intervals_ms(&peaks, sampling_rate_hz);
    Ok(rmssd(&rr))
}
