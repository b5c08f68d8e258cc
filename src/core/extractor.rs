//! Feature extractor adapter.
//!
//! The pipeline only needs to know whether a window produced a metric. All
//! stage-specific failures are folded into a single [`Extraction::Failed`]
//! outcome; the caller's one reaction is to skip the cycle.

use crate::core::buffer::Sample;
use crate::core::ecg::{self, ExtractionError};

/// Result of running an extractor over one analysis window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extraction {
    /// RMSSD in milliseconds, finite and non-negative.
    Metric(f64),
    /// The window could not be analysed.
    Failed,
}

impl Extraction {
    /// Get the metric, if extraction succeeded.
    pub fn metric(self) -> Option<f64> {
        match self {
            Extraction::Metric(value) => Some(value),
            Extraction::Failed => None,
        }
    }
}

/// The numerical HRV capability behind the adapter.
///
/// Implementations may fail for any reason; they may also return NaN, which
/// the adapter treats as an undefined metric.
pub trait FeatureExtractor: Send {
    fn compute(&self, window: &[Sample], sampling_rate_hz: u32) -> Result<f64, ExtractionError>;
}

/// Clean → detect → RMSSD over a single-lead ECG window.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcgHrvExtractor;

impl FeatureExtractor for EcgHrvExtractor {
    fn compute(&self, window: &[Sample], sampling_rate_hz: u32) -> Result<f64, ExtractionError> {
        ecg::hrv_rmssd(window, sampling_rate_hz)
    }
}

/// Run `extractor` and normalise its outcome.
///
/// NaN is coerced to `0.0`. Any error becomes [`Extraction::Failed`].
pub fn extract(
    extractor: &dyn FeatureExtractor,
    window: &[Sample],
    sampling_rate_hz: u32,
) -> Extraction {
    match extractor.compute(window, sampling_rate_hz) {
        Ok(value) if value.is_nan() => Extraction::Metric(0.0),
        Ok(value) if value.is_finite() => Extraction::Metric(value.max(0.0)),
        Ok(value) => {
            tracing::debug!(value, "extractor returned a non-finite metric");
            Extraction::Failed
        }
        Err(e) => {
            tracing::debug!(error = %e, "extraction failed");
            Extraction::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<f64, ExtractionError>);

    impl FeatureExtractor for Fixed {
        fn compute(&self, _: &[Sample], _: u32) -> Result<f64, ExtractionError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_nan_is_coerced_to_zero() {
        let outcome = extract(&Fixed(Ok(f64::NAN)), &[], 250);
        assert_eq!(outcome, Extraction::Metric(0.0));
    }

    #[test]
    fn test_errors_collapse_to_failed() {
        for err in [
            ExtractionError::TooFewPeaks(1),
            ExtractionError::NonFinite,
            ExtractionError::Filter("boom".into()),
        ] {
            assert_eq!(extract(&Fixed(Err(err)), &[], 250), Extraction::Failed);
        }
        assert_eq!(
            extract(&Fixed(Ok(f64::INFINITY)), &[], 250),
            Extraction::Failed
        );
    }

    #[test]
    fn test_metric_passthrough() {
        assert_eq!(extract(&Fixed(Ok(42.5)), &[], 250).metric(), Some(42.5));
    }

    #[test]
    fn test_two_peaks_yield_zero_metric() {
        // Two beats give one RR interval and no successive difference.
        let window: Vec<f64> = (0..500)
            .map(|i| {
                let a = (i as f64 - 100.0).powi(2);
                let b = (i as f64 - 350.0).powi(2);
                (-a / 8.0).exp() + (-b / 8.0).exp()
            })
            .collect();

        assert_eq!(
            extract(&EcgHrvExtractor, &window, 250),
            Extraction::Metric(0.0)
        );
    }

    #[test]
    fn test_noise_only_window_fails() {
        assert_eq!(
            extract(&EcgHrvExtractor, &[0.0; 100], 250),
            Extraction::Failed
        );
    }
}
