//! A load testing harness for message broker producers and consumers.
//!
//! The harness sends and receives a fixed number of messages through a
//! broker and measures how long that takes, in one of three modes:
//!
//! - **Sequential**: one iteration per message to send. A failed send is
//!   followed by a receive, which decides the outcome of the iteration.
//! - **Phase parallel**: all sends, then all receives, on one task.
//! - **Concurrent**: the send loop and the receive loop run on two tasks and
//!   are joined at the end.
//!
//! Each role folds its operations into a [`ResultAccumulator`]. Failed
//! operations are timed and counted, they never abort the run. Only setup
//! problems (bad configuration, a broker refusing a producer or consumer)
//! surface as [`Error`]s.
//!
//! ## Example
//!
//! ```no_run
//! use brokerload::{
//!     ConsumerOptions, Mode, ProducerOptions, Runner, TestPlan, channel::memory::MemoryBroker,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let plan = TestPlan::new(1000, 1000, "hello world", Mode::Concurrent)?;
//!     let producer = ProducerOptions::new("TOPIC-A", None)?;
//!     let consumer = ConsumerOptions::new("TOPIC-A", "sub_test", None)?;
//!
//!     let results = Runner::new(plan).run(MemoryBroker::new("local"), &producer, &consumer).await?;
//!     println!("sent {} messages", results.producer.success_count);
//!     Ok(())
//! }
//! ```
//!
//! Other brokers plug in by implementing [`Broker`] together with
//! [`MessageProducer`](channel::MessageProducer) and
//! [`MessageConsumer`](channel::MessageConsumer).
#![deny(missing_docs)]

mod accumulator;
mod broker;
mod engine;
mod error;
mod histogram;
mod plan;
mod report;
mod runner;
mod sampler;

pub mod channel;
pub mod cli;
pub mod config;
pub mod reporter;

pub use crate::{
    accumulator::{ResultAccumulator, Snapshot},
    broker::{Broker, ConnectionOptions, ConsumerOptions, ProducerOptions, TlsAuth},
    error::{Error, Result},
    histogram::LatencyHistogram,
    plan::{Mode, TestPlan},
    report::LoadTestReport,
    runner::{LoadTestResults, Runner},
    sampler::{OperationOutcome, sample},
};
