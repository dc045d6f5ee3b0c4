//! The load test report handed to reporters.
use crate::{plan::TestPlan, runner::LoadTestResults};

/// A finished run together with the plan that produced it.
#[derive(Clone, Debug)]
pub struct LoadTestReport {
    /// Messages the plan asked to send.
    pub produce_count: u64,
    /// Messages the plan asked to receive.
    pub consume_count: u64,
    /// Size of the payload sent per message.
    pub payload_size: u64,
    /// The results of the run.
    pub results: LoadTestResults,
}

impl LoadTestReport {
    /// Combine a plan with the results of running it.
    pub fn new(plan: &TestPlan, results: LoadTestResults) -> Self {
        Self {
            produce_count: plan.produce_count(),
            consume_count: plan.consume_count(),
            payload_size: plan.payload().len() as u64,
            results,
        }
    }

    /// Whether producer and consumer share one snapshot.
    pub fn is_combined(&self) -> bool {
        self.results.mode == crate::plan::Mode::Sequential
    }
}
