//! Runs a [`TestPlan`] against a broker and returns both roles' results.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::{Duration, Instant};

use crate::{
    accumulator::Snapshot,
    broker::{Broker, ConsumerOptions, ProducerOptions},
    channel::{MessageConsumer, MessageProducer},
    engine,
    error::{Error, Result},
    plan::{Mode, TestPlan},
};

/// The outcome of a finished run.
#[derive(Clone, Debug)]
pub struct LoadTestResults {
    /// The mode the run used.
    pub mode: Mode,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the whole run.
    pub elapsed: Duration,
    /// Results of the sending side.
    pub producer: Snapshot,
    /// Results of the receiving side. In sequential mode this is the same
    /// snapshot as [`producer`](Self::producer).
    pub consumer: Snapshot,
}

/// Executes one test plan.
#[derive(Clone, Debug)]
pub struct Runner {
    plan: Arc<TestPlan>,
}

impl Runner {
    /// Create a runner for the given plan.
    pub fn new(plan: TestPlan) -> Self {
        Self { plan: Arc::new(plan) }
    }

    /// The plan this runner executes.
    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    /// Create a producer and a consumer on `broker`, run the plan and close
    /// everything again.
    ///
    /// The broker is closed on every path. If the consumer cannot be created
    /// the already created producer is closed before the error is returned.
    pub async fn run<B: Broker>(
        &self,
        broker: B,
        producer_opts: &ProducerOptions,
        consumer_opts: &ConsumerOptions,
    ) -> Result<LoadTestResults> {
        let res = self.setup_and_run(&broker, producer_opts, consumer_opts).await;
        broker.close().await;
        res
    }

    async fn setup_and_run<B: Broker>(
        &self,
        broker: &B,
        producer_opts: &ProducerOptions,
        consumer_opts: &ConsumerOptions,
    ) -> Result<LoadTestResults> {
        let mut producer = broker.create_producer(producer_opts).await?;
        let consumer = match broker.subscribe(consumer_opts).await {
            Ok(consumer) => consumer,
            Err(e) => {
                close_producer(&mut producer).await;
                return Err(e);
            }
        };
        self.run_with(producer, consumer).await
    }

    /// Run the plan on already created channel halves and close them afterwards.
    ///
    /// Per-operation failures end up in the snapshots. The only error is a
    /// role task of a concurrent run dying before it could report. A task
    /// that panics takes its channel down with it, so that channel is dropped
    /// without being closed; the other role's channel is still closed.
    pub async fn run_with<P, C>(&self, mut producer: P, mut consumer: C) -> Result<LoadTestResults>
    where
        P: MessageProducer + 'static,
        C: MessageConsumer + 'static,
    {
        let mode = self.plan.mode();
        let started_at = Utc::now();
        let start = Instant::now();

        #[cfg(feature = "tracing")]
        log::info!(
            "starting {mode} load test: {} sends, {} receives, {} byte payload",
            self.plan.produce_count(),
            self.plan.consume_count(),
            self.plan.payload().len()
        );

        let (producer_snapshot, consumer_snapshot) = match mode {
            Mode::Sequential => {
                let snapshot = engine::sequential(&self.plan, &mut producer, &mut consumer).await;
                close_producer(&mut producer).await;
                close_consumer(&mut consumer).await;
                (snapshot.clone(), snapshot)
            }
            Mode::PhaseParallel => {
                let snapshots = engine::phase_parallel(&self.plan, &mut producer, &mut consumer).await;
                close_producer(&mut producer).await;
                close_consumer(&mut consumer).await;
                snapshots
            }
            Mode::Concurrent => {
                let (sent, received) = engine::concurrent(self.plan.clone(), producer, consumer).await;
                let sent = match sent {
                    Ok((mut producer, snapshot)) => {
                        close_producer(&mut producer).await;
                        Ok(snapshot)
                    }
                    Err(source) => Err(Error::Task { role: "producer", source }),
                };
                let received = match received {
                    Ok((mut consumer, snapshot)) => {
                        close_consumer(&mut consumer).await;
                        Ok(snapshot)
                    }
                    Err(source) => Err(Error::Task { role: "consumer", source }),
                };
                (sent?, received?)
            }
        };

        let elapsed = start.elapsed();
        #[cfg(feature = "tracing")]
        log::info!("{mode} load test finished in {:.3}s", elapsed.as_secs_f64());

        Ok(LoadTestResults {
            mode,
            started_at,
            elapsed,
            producer: producer_snapshot,
            consumer: consumer_snapshot,
        })
    }
}

async fn close_producer<P: MessageProducer + ?Sized>(producer: &mut P) {
    if let Err(_e) = producer.close().await {
        #[cfg(feature = "tracing")]
        log::warn!("failed to close producer: {_e}");
    }
}

async fn close_consumer<C: MessageConsumer + ?Sized>(consumer: &mut C) {
    if let Err(_e) = consumer.close().await {
        #[cfg(feature = "tracing")]
        log::warn!("failed to close consumer: {_e}");
    }
}
