//! Click-driven metric simulator.
//!
//! Stands in for a real sensor: the more often the trigger key is hit in the
//! trailing window, the lower (more "stressed") the published metric. No
//! buffer or extractor is involved.

use crate::config::Config;
use crate::output::{MetricReading, MetricSink};
use crate::session::SharedSessionStats;
use crate::shutdown::Shutdown;
use crate::source::trigger::TriggerKey;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Metric with no clicks in the window.
pub const RESTING_METRIC: f64 = 90.0;

/// Metric drop per click in the window.
pub const METRIC_PER_CLICK: f64 = 6.0;

/// Map a click count onto the metric scale, before noise.
pub fn click_metric(click_count: usize, floor: f64, ceiling: f64) -> f64 {
    (RESTING_METRIC - METRIC_PER_CLICK * click_count as f64).clamp(floor, ceiling)
}

/// Debounced click timestamps within a trailing window.
#[derive(Debug, Clone)]
pub struct ClickHistory {
    events: VecDeque<Instant>,
    window: Duration,
    debounce: Duration,
}

impl ClickHistory {
    /// Create an empty history.
    pub fn new(window: Duration, debounce: Duration) -> Self {
        Self {
            events: VecDeque::new(),
            window,
            debounce,
        }
    }

    /// Record a press at `now` unless it falls within the debounce interval
    /// of the previous click. Returns whether it was recorded.
    pub fn register_press_at(&mut self, now: Instant) -> bool {
        if let Some(&last) = self.events.back() {
            if now.saturating_duration_since(last) < self.debounce {
                return false;
            }
        }
        self.events.push_back(now);
        true
    }

    /// Drop clicks older than the window.
    pub fn prune_at(&mut self, now: Instant) {
        while let Some(&first) = self.events.front() {
            if now.saturating_duration_since(first) <= self.window {
                break;
            }
            self.events.pop_front();
        }
    }

    /// Number of clicks inside the window.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if no clicks are inside the window.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Polls a trigger and publishes a synthesised metric every tick.
pub struct SimulatedClickSource<T: TriggerKey, R: Rng = StdRng> {
    trigger: T,
    rng: R,
    history: ClickHistory,
    tick: Duration,
    floor: f64,
    ceiling: f64,
    noise_amplitude: f64,
    stats: SharedSessionStats,
}

impl<T: TriggerKey> SimulatedClickSource<T, StdRng> {
    /// Create a simulator with an entropy-seeded noise source.
    pub fn new(config: &Config, trigger: T, stats: SharedSessionStats) -> Self {
        Self::with_rng(config, trigger, StdRng::from_entropy(), stats)
    }
}

impl<T: TriggerKey, R: Rng> SimulatedClickSource<T, R> {
    /// Create a simulator drawing noise from `rng`.
    pub fn with_rng(config: &Config, trigger: T, rng: R, stats: SharedSessionStats) -> Self {
        Self {
            trigger,
            rng,
            history: ClickHistory::new(config.click_window, config.click_debounce),
            tick: config.simulation_tick,
            floor: config.metric_floor,
            ceiling: config.metric_ceiling,
            noise_amplitude: config.noise_amplitude,
            stats,
        }
    }

    /// Get the click history.
    pub fn history(&self) -> &ClickHistory {
        &self.history
    }

    /// One loop iteration as if run at `now`.
    pub fn step_at<S: MetricSink>(&mut self, now: Instant, sink: &mut S) -> MetricReading {
        if self.trigger.is_pressed() && self.history.register_press_at(now) {
            self.stats.record_click();
        }
        self.history.prune_at(now);

        let clicks = self.history.len();
        let amplitude = self.noise_amplitude;
        let noise = if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        };
        let metric = click_metric(clicks, self.floor, self.ceiling) + noise;
        let reading = MetricReading::simulated(metric, clicks);

        sink.publish(&reading);
        reading
    }

    /// Run until shutdown is requested.
    pub async fn run<S: MetricSink>(&mut self, sink: &mut S, shutdown: &Shutdown) {
        tracing::info!(tick = ?self.tick, "click simulation started");
        while !shutdown.is_requested() {
            self.step_at(Instant::now(), sink);
            tokio::time::sleep(self.tick).await;
        }
        tracing::info!(clicks = self.history.len(), "click simulation stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::create_shared_stats;
    use crate::source::trigger::NoopTrigger;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_click_metric_mapping() {
        assert_eq!(click_metric(0, 10.0, 100.0), 90.0);
        assert_eq!(click_metric(10, 10.0, 100.0), 30.0);
        assert_eq!(click_metric(14, 10.0, 100.0), 10.0);
        assert_eq!(click_metric(100, 10.0, 100.0), 10.0);

        let values: Vec<f64> = (0..20).map(|n| click_metric(n, 10.0, 100.0)).collect();
        assert!(values.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_debounce() {
        let mut history = ClickHistory::new(Duration::from_secs(5), 100 * MS);
        let t0 = Instant::now();

        assert!(history.register_press_at(t0));
        assert!(!history.register_press_at(t0 + 50 * MS));
        assert!(!history.register_press_at(t0 + 99 * MS));
        assert!(history.register_press_at(t0 + 100 * MS));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_prune_drops_old_clicks() {
        let mut history = ClickHistory::new(Duration::from_secs(5), 100 * MS);
        let t0 = Instant::now();

        history.register_press_at(t0);
        history.register_press_at(t0 + Duration::from_secs(2));

        history.prune_at(t0 + Duration::from_secs(5));
        assert_eq!(history.len(), 2);

        history.prune_at(t0 + Duration::from_millis(5001));
        assert_eq!(history.len(), 1);

        history.prune_at(t0 + Duration::from_secs(8));
        assert!(history.is_empty());
    }

    #[test]
    fn test_idle_step_publishes_resting_metric() {
        struct Last(Option<MetricReading>);
        impl MetricSink for Last {
            fn publish(&mut self, reading: &MetricReading) {
                self.0 = Some(*reading);
            }
        }

        let config = Config {
            noise_amplitude: 0.0,
            ..Config::default()
        };
        let mut source = SimulatedClickSource::with_rng(
            &config,
            NoopTrigger,
            StdRng::seed_from_u64(1),
            create_shared_stats(),
        );
        let mut sink = Last(None);

        let reading = source.step_at(Instant::now(), &mut sink);
        assert_eq!(reading, MetricReading::simulated(90.0, 0));
        assert_eq!(sink.0, Some(reading));
    }
}
