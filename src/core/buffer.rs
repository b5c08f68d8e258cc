//! Capacity-bounded sample buffer.
//!
//! Samples are appended in arrival order. Once the buffer grows past its
//! retention limit it is cut back to the most recent `trim_target` samples in
//! one bulk copy, instead of evicting one sample at a time.

/// A single ECG amplitude reading, in sensor-defined units.
pub type Sample = f64;

/// Append-only sample store with a trim-on-overflow policy.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<Sample>,
    retention_limit: usize,
    trim_target: usize,
}

impl SampleBuffer {
    /// Create a buffer that trims to `trim_target` samples whenever it holds
    /// more than `retention_limit`.
    ///
    /// `trim_target` is capped at `retention_limit`.
    pub fn new(retention_limit: usize, trim_target: usize) -> Self {
        Self {
            samples: Vec::with_capacity(retention_limit),
            retention_limit,
            trim_target: trim_target.min(retention_limit),
        }
    }

    /// Create a buffer sized in seconds at the given sampling rate.
    pub fn for_rate(sampling_rate_hz: u32, retention_secs: u32, trim_secs: u32) -> Self {
        Self::new(
            (sampling_rate_hz as usize).saturating_mul(retention_secs as usize),
            (sampling_rate_hz as usize).saturating_mul(trim_secs as usize),
        )
    }

    /// Append a batch in order, then trim if the retention limit is exceeded.
    pub fn ingest(&mut self, batch: &[Sample]) {
        self.samples.extend_from_slice(batch);

        if self.samples.len() > self.retention_limit {
            let excess = self.samples.len() - self.trim_target;
            self.samples.drain(..excess);
        }
    }

    /// The most recent `size` samples, or `None` if fewer are buffered.
    pub fn latest(&self, size: usize) -> Option<&[Sample]> {
        let len = self.samples.len();
        if len < size {
            return None;
        }
        Some(&self.samples[len - size..])
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing has been buffered yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length above which the buffer is trimmed.
    pub fn retention_limit(&self) -> usize {
        self.retention_limit
    }

    /// All buffered samples, oldest first.
    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: usize, len: usize) -> Vec<Sample> {
        (start..start + len).map(|i| i as f64).collect()
    }

    #[test]
    fn test_ingest_preserves_order() {
        let mut buffer = SampleBuffer::new(100, 50);
        buffer.ingest(&ramp(0, 10));
        buffer.ingest(&[]);
        buffer.ingest(&ramp(10, 5));

        assert_eq!(buffer.len(), 15);
        assert_eq!(buffer.as_slice(), ramp(0, 15).as_slice());
    }

    #[test]
    fn test_trim_keeps_most_recent() {
        let mut buffer = SampleBuffer::new(100, 50);
        buffer.ingest(&ramp(0, 100));
        // At the limit, not over it
        assert_eq!(buffer.len(), 100);

        buffer.ingest(&ramp(100, 1));
        assert_eq!(buffer.len(), 50);
        assert_eq!(buffer.as_slice(), ramp(51, 50).as_slice());
    }

    #[test]
    fn test_bound_holds_for_any_batch_sequence() {
        let mut buffer = SampleBuffer::for_rate(250, 20, 10);
        let mut next = 0;
        for batch_len in [0, 1, 7, 130, 2500, 4999, 3, 10_000, 64] {
            buffer.ingest(&ramp(next, batch_len));
            next += batch_len;

            assert!(buffer.len() <= buffer.retention_limit());
            // Newest sample is always last
            if let Some(&last) = buffer.as_slice().last() {
                assert_eq!(last, (next - 1) as f64);
            }
        }
    }

    #[test]
    fn test_oversized_batch_trims_in_one_step() {
        let mut buffer = SampleBuffer::new(100, 50);
        buffer.ingest(&ramp(0, 1000));
        assert_eq!(buffer.as_slice(), ramp(950, 50).as_slice());
    }

    #[test]
    fn test_latest_window() {
        let mut buffer = SampleBuffer::new(100, 50);
        buffer.ingest(&ramp(0, 20));

        assert!(buffer.latest(21).is_none());
        assert_eq!(buffer.latest(5).unwrap(), &[15.0, 16.0, 17.0, 18.0, 19.0]);
        assert_eq!(buffer.latest(20).unwrap().len(), 20);
    }
}
