//! Synthetic single-lead ECG.
//!
//! Each beat is a sum of Gaussian P, Q, R, S and T waves placed relative to
//! the R peak. RR intervals jitter uniformly around the configured heart
//! rate; a slow sinusoid adds baseline wander and uniform noise sits on top.

use crate::source::driver::{DriverError, EcgDevice, EcgDriver, FrameCallback};
use crate::source::stream::{SampleGenerator, StreamingDevice};
use crate::source::types::DeviceInfo;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::f64::consts::PI;

/// Gaussian waves of one beat as (offset from R in seconds, amplitude, width
/// in seconds), in P, Q, R, S, T order.
static WAVES: [(f64, f64, f64); 5] = [
    (-0.20, 0.12, 0.025),
    (-0.03, -0.10, 0.010),
    (0.00, 1.00, 0.010),
    (0.03, -0.20, 0.010),
    (0.25, 0.25, 0.040),
];

/// Beats further than this from the current time contribute nothing.
const BEAT_REACH_SECS: f64 = 0.6;

/// Shape of the generated signal.
#[derive(Debug, Clone)]
pub struct SyntheticParams {
    pub heart_rate_bpm: f64,
    /// Half-width of the uniform RR jitter
    pub rr_jitter_ms: f64,
    pub wander_amplitude: f64,
    pub wander_hz: f64,
    /// Half-width of the uniform additive noise
    pub noise_amplitude: f64,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            heart_rate_bpm: 68.0,
            rr_jitter_ms: 35.0,
            wander_amplitude: 0.1,
            wander_hz: 0.25,
            noise_amplitude: 0.02,
        }
    }
}

/// Stateful ECG generator; successive calls continue the same signal.
pub struct EcgSynthesizer {
    params: SyntheticParams,
    rng: StdRng,
    /// R-peak times in seconds
    beats: VecDeque<f64>,
    /// Index of the next sample to generate
    position: u64,
}

impl EcgSynthesizer {
    /// Create a synthesizer drawing jitter and noise from `rng`.
    pub fn new(params: SyntheticParams, rng: StdRng) -> Self {
        Self {
            params,
            rng,
            beats: VecDeque::new(),
            position: 0,
        }
    }

    /// Create a reproducible synthesizer.
    pub fn seeded(params: SyntheticParams, seed: u64) -> Self {
        Self::new(params, StdRng::seed_from_u64(seed))
    }

    fn next_rr(&mut self) -> f64 {
        let base = 60.0 / self.params.heart_rate_bpm.max(1.0);
        let jitter = self.params.rr_jitter_ms / 1000.0;
        if jitter > 0.0 {
            base + self.rng.gen_range(-jitter..=jitter)
        } else {
            base
        }
    }

    fn schedule_beats(&mut self, t: f64) {
        if self.beats.is_empty() {
            // First R peak lands a little after the start
            self.beats.push_back(0.3);
        }
        while self.beats.back().is_some_and(|&last| last < t + BEAT_REACH_SECS) {
            let next = self.beats.back().copied().unwrap_or(0.0) + self.next_rr();
            self.beats.push_back(next);
        }
        while self.beats.front().is_some_and(|&first| first < t - BEAT_REACH_SECS) {
            self.beats.pop_front();
        }
    }

    fn sample_at(&mut self, t: f64) -> f64 {
        self.schedule_beats(t);

        let heart: f64 = self
            .beats
            .iter()
            .flat_map(|&r| {
                WAVES.iter().map(move |&(offset, amplitude, width)| {
                    let d = t - (r + offset);
                    amplitude * (-d * d / (2.0 * width * width)).exp()
                })
            })
            .sum();

        let wander = self.params.wander_amplitude * (2.0 * PI * self.params.wander_hz * t).sin();
        let amplitude = self.params.noise_amplitude;
        let noise = if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        };

        heart + wander + noise
    }
}

impl SampleGenerator for EcgSynthesizer {
    fn generate(&mut self, count: usize, sampling_rate_hz: u32) -> Vec<f64> {
        let dt = 1.0 / f64::from(sampling_rate_hz.max(1));
        (0..count)
            .map(|_| {
                let t = self.position as f64 * dt;
                self.position += 1;
                self.sample_at(t)
            })
            .collect()
    }
}

/// Generate `seconds` of ECG in one go.
pub fn synthesize_ecg(
    params: SyntheticParams,
    sampling_rate_hz: u32,
    seconds: f64,
    seed: u64,
) -> Vec<f64> {
    let count = (seconds * f64::from(sampling_rate_hz)).round() as usize;
    EcgSynthesizer::seeded(params, seed).generate(count, sampling_rate_hz)
}

/// Driver exposing a single synthetic device.
pub struct SyntheticEcgDriver {
    params: SyntheticParams,
}

impl SyntheticEcgDriver {
    pub const DEVICE_NAME: &'static str = "Synthetic ECG";
    pub const DEVICE_ADDRESS: &'static str = "00:00:00:00:00:00";

    /// Create a driver whose device generates `params`-shaped ECG.
    pub fn new(params: SyntheticParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl EcgDriver for SyntheticEcgDriver {
    async fn detect_devices(&mut self) -> Result<Vec<DeviceInfo>, DriverError> {
        Ok(vec![DeviceInfo::new(Self::DEVICE_NAME, Self::DEVICE_ADDRESS)])
    }

    async fn connect(
        &mut self,
        device: DeviceInfo,
        callback: FrameCallback,
    ) -> Result<Box<dyn EcgDevice>, DriverError> {
        let generator = EcgSynthesizer::new(self.params.clone(), StdRng::from_entropy());
        Ok(Box::new(StreamingDevice::new(device, callback, generator)))
    }
}
