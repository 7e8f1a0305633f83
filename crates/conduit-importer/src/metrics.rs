//! Block fetch timing.
//!
//! The fetcher reports how long each raw block download took. The Runner
//! decides where that goes: a Prometheus histogram, or nowhere.

use prometheus::core::Collector;
use prometheus::{Histogram, HistogramOpts};

/// Name of the raw block fetch histogram, before the subsystem prefix.
pub const RAW_BLOCK_TIME_METRIC: &str = "get_algod_raw_block_time_sec";

/// Receives fetch timings.
pub trait MetricsSink: Send + Sync {
    /// Record a successful raw block download that took `seconds`.
    fn observe_raw_block_fetch(&self, seconds: f64);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn observe_raw_block_fetch(&self, _seconds: f64) {}
}

/// Prometheus histogram of raw block fetch times.
#[derive(Clone)]
pub struct RawBlockTimer {
    histogram: Histogram,
}

impl RawBlockTimer {
    /// Create the histogram as `<subsystem>_get_algod_raw_block_time_sec`.
    pub fn new(subsystem: &str) -> prometheus::Result<Self> {
        let opts = HistogramOpts::new(
            RAW_BLOCK_TIME_METRIC,
            "Total response time from Algod's raw block endpoint in seconds.",
        )
        .subsystem(subsystem);

        Ok(Self {
            histogram: Histogram::with_opts(opts)?,
        })
    }

    /// Collectors to hand to the Runner's registry.
    pub fn collectors(&self) -> Vec<Box<dyn Collector>> {
        vec![Box::new(self.histogram.clone())]
    }
}

impl MetricsSink for RawBlockTimer {
    fn observe_raw_block_fetch(&self, seconds: f64) {
        self.histogram.observe(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_histogram_registered_under_subsystem() {
        let timer = RawBlockTimer::new("conduit").unwrap();
        let registry = Registry::new();
        for collector in timer.collectors() {
            registry.register(collector).unwrap();
        }

        timer.observe_raw_block_fetch(0.25);
        timer.observe_raw_block_fetch(1.5);

        let families = registry.gather();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_name(), "conduit_get_algod_raw_block_time_sec");

        let histogram = families[0].get_metric()[0].get_histogram();
        assert_eq!(histogram.get_sample_count(), 2);
        assert!((histogram.get_sample_sum() - 1.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_noop_accepts_observations() {
        NoopMetrics.observe_raw_block_fetch(3.0);
    }
}
