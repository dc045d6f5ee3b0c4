//! Folding operation outcomes into per-role results.
use std::collections::BTreeMap;

use tokio::time::Duration;

use crate::{histogram::LatencyHistogram, sampler::OperationOutcome};

/// Running totals for one role of a run.
///
/// An accumulator is owned by exactly one loop. [`finalize`](Self::finalize)
/// consumes it, so nothing can be observed after the snapshot is taken.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    totals: Snapshot,
}

impl ResultAccumulator {
    /// Create an empty accumulator. The payload length is taken from the
    /// first successful operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty accumulator for a role moving a known payload.
    pub fn with_payload_length(len: u64) -> Self {
        let mut acc = Self::default();
        acc.totals.payload_length = Some(len);
        acc
    }

    /// Fold one outcome in.
    ///
    /// Every outcome adds to the total elapsed time. Payload bytes and
    /// latencies only count for successes.
    pub fn observe(&mut self, outcome: OperationOutcome) {
        let t = &mut self.totals;
        t.total_elapsed += outcome.duration;
        if outcome.succeeded {
            t.success_count += 1;
            t.total_payload_bytes += outcome.payload_size;
            if t.payload_length.is_none() {
                t.payload_length = Some(outcome.payload_size);
            }
            t.successful_elapsed += outcome.duration;
            t.latency.record(outcome.duration);
        } else {
            t.failure_count += 1;
            let error = outcome.error.unwrap_or_else(|| "unknown error".to_owned());
            *t.error_dist.entry(error).or_default() += 1;
        }
    }

    /// Number of outcomes observed so far.
    pub fn iterations(&self) -> u64 {
        self.totals.iterations()
    }

    /// Stop accumulating and return the final results.
    pub fn finalize(self) -> Snapshot {
        self.totals
    }
}

/// The final results of one role.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// Time spent in all operations, failed ones included.
    pub total_elapsed: Duration,
    /// Number of successful operations.
    pub success_count: u64,
    /// Number of failed operations.
    pub failure_count: u64,
    /// Bytes moved by successful operations.
    pub total_payload_bytes: u64,
    /// Latencies of successful operations.
    pub latency: LatencyHistogram,
    /// Failure counts by error message.
    pub error_dist: BTreeMap<String, u64>,
    successful_elapsed: Duration,
    payload_length: Option<u64>,
}

impl Snapshot {
    /// Number of operations performed.
    pub fn iterations(&self) -> u64 {
        self.success_count + self.failure_count
    }

    /// Time spent in successful operations.
    pub fn successful_elapsed(&self) -> Duration {
        self.successful_elapsed
    }

    /// Total elapsed time over the time spent in successful operations.
    ///
    /// This is `1.0` when nothing failed and grows with the share of time
    /// lost to failures. Returns `None` when no operation succeeded, or when
    /// successes took no measurable time, as the ratio is undefined then.
    pub fn throughput_metric(&self) -> Option<f64> {
        if self.success_count == 0 || self.successful_elapsed.is_zero() {
            return None;
        }
        Some(self.total_elapsed.as_secs_f64() / self.successful_elapsed.as_secs_f64())
    }

    /// Mean latency of successful operations in seconds, `None` without successes.
    pub fn seconds_per_payload(&self) -> Option<f64> {
        if self.success_count == 0 {
            return None;
        }
        Some(self.successful_elapsed.as_secs_f64() / self.success_count as f64)
    }

    /// Length of the payload this role moved, if known.
    pub fn payload_length(&self) -> Option<u64> {
        self.payload_length
    }

    /// `success_count * payload_length / 8`, rounded down. Zero when the
    /// payload length is unknown.
    pub fn accumulative_payload_size(&self) -> u64 {
        self.success_count * self.payload_length.unwrap_or(0) / 8
    }

    /// Share of operations which succeeded, `0.0` when none ran.
    pub fn success_ratio(&self) -> f64 {
        match self.iterations() {
            0 => 0.0,
            n => self.success_count as f64 / n as f64,
        }
    }
}
