//! The immutable description of one load test run.
use std::time::Duration;

use serde::Serialize;

use crate::error::{Error, Result};

/// Concurrency discipline of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Send, and receive in place of a failed send, one iteration at a time.
    Sequential,
    /// All sends, then all receives, on one task.
    PhaseParallel,
    /// Producer and consumer loops on two independent tasks.
    Concurrent,
}

impl Mode {
    /// Pick the mode from the two configuration flags.
    ///
    /// `concurrent` wins over `parallel`; neither means [`Mode::Sequential`].
    pub fn select(parallel: bool, concurrent: bool) -> Self {
        match (parallel, concurrent) {
            (_, true) => Mode::Concurrent,
            (true, false) => Mode::PhaseParallel,
            (false, false) => Mode::Sequential,
        }
    }
}

/// One run's size, payload and mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestPlan {
    produce_count: u64,
    consume_count: u64,
    payload: Vec<u8>,
    mode: Mode,
    receive_timeout: Option<Duration>,
}

impl TestPlan {
    /// Create a plan, rejecting zero counts and an empty payload.
    pub fn new(produce_count: u64, consume_count: u64, payload: impl Into<Vec<u8>>, mode: Mode) -> Result<Self> {
        if produce_count == 0 {
            return Err(Error::InvalidPlan("produce quantity must be positive"));
        }
        if consume_count == 0 {
            return Err(Error::InvalidPlan("consume quantity must be positive"));
        }
        let payload = payload.into();
        if payload.is_empty() {
            return Err(Error::InvalidPlan("payload must not be empty"));
        }
        Ok(Self { produce_count, consume_count, payload, mode, receive_timeout: None })
    }

    /// Fail receives which take longer than `timeout` instead of waiting forever.
    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Number of messages to send.
    pub fn produce_count(&self) -> u64 {
        self.produce_count
    }

    /// Number of messages to receive.
    pub fn consume_count(&self) -> u64 {
        self.consume_count
    }

    /// The message body every send uses.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The concurrency mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The receive timeout, if any.
    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_flag_takes_precedence() {
        assert_eq!(Mode::select(false, false), Mode::Sequential);
        assert_eq!(Mode::select(true, false), Mode::PhaseParallel);
        assert_eq!(Mode::select(false, true), Mode::Concurrent);
        assert_eq!(Mode::select(true, true), Mode::Concurrent);
    }

    #[test]
    fn mode_display() {
        assert_eq!(Mode::PhaseParallel.to_string(), "phase-parallel");
        assert_eq!(Mode::Concurrent.to_string(), "concurrent");
    }

    #[test]
    fn plan_validation() {
        assert!(matches!(TestPlan::new(0, 1, "abc", Mode::Sequential), Err(Error::InvalidPlan(_))));
        assert!(matches!(TestPlan::new(1, 0, "abc", Mode::Sequential), Err(Error::InvalidPlan(_))));
        assert!(matches!(TestPlan::new(1, 1, "", Mode::Sequential), Err(Error::InvalidPlan(_))));

        let plan = TestPlan::new(3, 2, "abc", Mode::Concurrent).unwrap();
        assert_eq!(plan.payload(), b"abc");
        assert_eq!(plan.receive_timeout(), None);

        let plan = plan.with_receive_timeout(Some(Duration::ZERO));
        assert_eq!(plan.receive_timeout(), None);
        let plan = plan.with_receive_timeout(Some(Duration::from_secs(1)));
        assert_eq!(plan.receive_timeout(), Some(Duration::from_secs(1)));
    }
}
