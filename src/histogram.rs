//! A thin wrapper around [`hdrhistogram::Histogram`] for operation latencies.
use std::time::Duration;

use hdrhistogram::Histogram;

/// Percentiles shown in reports.
pub(crate) const PERCENTAGES: &[f64] = &[50.0, 75.0, 90.0, 95.0, 99.0, 99.9];

/// Highest trackable latency, one hour in nanoseconds.
const MAX_TRACKABLE_NANOS: u64 = 3_600 * 1_000_000_000;

/// Latencies of successful operations, in nanoseconds.
#[derive(Clone, Debug)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
}

impl LatencyHistogram {
    /// Creates an empty latency histogram tracking up to one hour.
    pub fn new() -> LatencyHistogram {
        let hist = Histogram::<u64>::new_with_bounds(1, MAX_TRACKABLE_NANOS, 3).expect("create histogram");
        Self { hist }
    }

    /// Records a latency value. Values above one hour are clamped.
    pub fn record(&mut self, d: Duration) {
        let nanos = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        self.hist.saturating_record(nanos);
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.hist.is_empty()
    }

    /// Number of recorded values.
    pub fn len(&self) -> u64 {
        self.hist.len()
    }

    /// Highest recorded latency.
    pub fn max(&self) -> Duration {
        Duration::from_nanos(self.hist.max())
    }

    /// Lowest recorded latency.
    pub fn min(&self) -> Duration {
        Duration::from_nanos(self.hist.min())
    }

    /// Mean of the recorded latencies.
    pub fn mean(&self) -> Duration {
        Duration::from_nanos(self.hist.mean() as u64)
    }

    /// Standard deviation of the recorded latencies.
    pub fn stdev(&self) -> Duration {
        Duration::from_nanos(self.hist.stdev() as u64)
    }

    /// Median of the recorded latencies.
    pub fn median(&self) -> Duration {
        self.value_at_quantile(0.5)
    }

    /// Latency at the given quantile.
    pub fn value_at_quantile(&self, q: f64) -> Duration {
        Duration::from_nanos(self.hist.value_at_quantile(q))
    }

    /// Latency at each of the given percentages.
    pub fn percentiles<'a>(&'a self, percentages: &'a [f64]) -> impl Iterator<Item = (f64, Duration)> + 'a {
        percentages.iter().map(|&p| (p, self.value_at_quantile(p / 100.0)))
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}
