//! The three execution strategies.
//!
//! Every loop samples its operations through [`sample`] and folds the
//! outcomes into a [`ResultAccumulator`] it owns. Failed operations are
//! counted and the loop moves on; nothing in here returns an error.
use std::sync::Arc;

use tokio::{task::JoinError, time::Duration};

use crate::{
    accumulator::{ResultAccumulator, Snapshot},
    channel::{ChannelError, Message, MessageConsumer, MessageProducer},
    plan::TestPlan,
    sampler::sample,
};

/// Receive one message, giving up after `timeout` if one is set.
async fn receive<C>(consumer: &mut C, timeout: Option<Duration>) -> Result<Message, ChannelError>
where
    C: MessageConsumer + ?Sized,
{
    match timeout {
        Some(t) => tokio::time::timeout(t, consumer.receive())
            .await
            .unwrap_or(Err(ChannelError::Timeout)),
        None => consumer.receive().await,
    }
}

/// One iteration per message to produce. A failed send is replaced by a
/// receive, and the iteration counts as whatever that receive did.
///
/// Both roles share the returned snapshot.
pub(crate) async fn sequential<P, C>(plan: &TestPlan, producer: &mut P, consumer: &mut C) -> Snapshot
where
    P: MessageProducer + ?Sized,
    C: MessageConsumer + ?Sized,
{
    let payload = plan.payload();
    let timeout = plan.receive_timeout();
    let mut acc = ResultAccumulator::with_payload_length(payload.len() as u64);

    for _seq in 0..plan.produce_count() {
        let iteration = async {
            match producer.send(payload).await {
                Ok(_) => Ok(payload.len() as u64),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    log::debug!("send #{_seq} failed, receiving instead: {_e}");
                    receive(consumer, timeout).await.map(|m| m.len() as u64)
                }
            }
        };
        let (_, outcome) = sample(iteration, |&n| n).await;
        acc.observe(outcome);
    }

    acc.finalize()
}

/// All sends, then all receives, on the calling task.
pub(crate) async fn phase_parallel<P, C>(plan: &TestPlan, producer: &mut P, consumer: &mut C) -> (Snapshot, Snapshot)
where
    P: MessageProducer + ?Sized,
    C: MessageConsumer + ?Sized,
{
    let sent = send_loop(plan, producer).await;
    let received = receive_loop(plan, consumer).await;
    (sent, received)
}

/// Result of one role task of a concurrent run. The channel is handed back
/// so the caller can close it.
pub(crate) type RoleResult<T> = Result<(T, Snapshot), JoinError>;

/// Send and receive loops on two spawned tasks, joined at the end.
///
/// The tasks share nothing but the read-only plan. A task that panics
/// yields a `JoinError` and its channel is gone with it.
pub(crate) async fn concurrent<P, C>(plan: Arc<TestPlan>, mut producer: P, mut consumer: C) -> (RoleResult<P>, RoleResult<C>)
where
    P: MessageProducer + 'static,
    C: MessageConsumer + 'static,
{
    let send_plan = plan.clone();
    let sending = tokio::spawn(async move {
        #[cfg(feature = "tracing")]
        log::info!("sending messages: start");
        let snapshot = send_loop(&send_plan, &mut producer).await;
        #[cfg(feature = "tracing")]
        log::info!("sending messages: finish");
        (producer, snapshot)
    });

    let receiving = tokio::spawn(async move {
        #[cfg(feature = "tracing")]
        log::info!("receiving messages: start");
        let snapshot = receive_loop(&plan, &mut consumer).await;
        #[cfg(feature = "tracing")]
        log::info!("receiving messages: finish");
        (consumer, snapshot)
    });

    tokio::join!(sending, receiving)
}

/// Send the plan's payload `produce_count` times.
pub(crate) async fn send_loop<P>(plan: &TestPlan, producer: &mut P) -> Snapshot
where
    P: MessageProducer + ?Sized,
{
    let payload = plan.payload();
    let mut acc = ResultAccumulator::with_payload_length(payload.len() as u64);

    for _seq in 0..plan.produce_count() {
        let (_res, outcome) = sample(producer.send(payload), |_| payload.len() as u64).await;
        #[cfg(feature = "tracing")]
        if let Err(e) = &_res {
            log::debug!("send #{_seq} failed: {e}");
        }
        acc.observe(outcome);
    }

    acc.finalize()
}

/// Receive `consume_count` messages.
///
/// Payload bytes are those of the messages actually received. The payload
/// length behind the accumulative size is that of the first one.
pub(crate) async fn receive_loop<C>(plan: &TestPlan, consumer: &mut C) -> Snapshot
where
    C: MessageConsumer + ?Sized,
{
    let timeout = plan.receive_timeout();
    let mut acc = ResultAccumulator::new();

    for _seq in 0..plan.consume_count() {
        let (_res, outcome) = sample(receive(consumer, timeout), |m| m.len() as u64).await;
        #[cfg(feature = "tracing")]
        if let Err(e) = &_res {
            log::debug!("receive #{_seq} failed: {e}");
        }
        acc.observe(outcome);
    }

    acc.finalize()
}
