//! Scripted channels and brokers for engine and runner tests.
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use super::{ChannelError, Message, MessageConsumer, MessageId, MessageProducer};
use crate::{
    broker::{Broker, ConsumerOptions, ProducerOptions},
    error::{Error, Result},
};

/// Outcome of one scripted call.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Step {
    Ok(Duration),
    Fail(Duration),
    /// Never completes.
    Hang,
    Panic,
}

impl Step {
    async fn play(self) -> bool {
        match self {
            Step::Ok(d) => {
                tokio::time::sleep(d).await;
                true
            }
            Step::Fail(d) => {
                tokio::time::sleep(d).await;
                false
            }
            Step::Hang => std::future::pending().await,
            Step::Panic => panic!("scripted panic"),
        }
    }
}

/// Plays `script` in order, then repeats `fallback` forever.
#[derive(Clone, Debug)]
struct Script {
    steps: VecDeque<Step>,
    fallback: Step,
}

impl Script {
    fn next(&mut self) -> Step {
        self.steps.pop_front().unwrap_or(self.fallback)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Calls {
    pub calls: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl Calls {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub(crate) struct MockProducer {
    script: Script,
    next_id: u64,
    pub counters: Calls,
}

impl MockProducer {
    pub fn always(step: Step) -> Self {
        Self::scripted(std::iter::empty(), step)
    }

    pub fn scripted(steps: impl IntoIterator<Item = Step>, fallback: Step) -> Self {
        let script = Script { steps: steps.into_iter().collect(), fallback };
        Self { script, next_id: 0, counters: Calls::default() }
    }
}

#[async_trait]
impl MessageProducer for MockProducer {
    async fn send(&mut self, _payload: &[u8]) -> std::result::Result<MessageId, ChannelError> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        if self.script.next().play().await {
            self.next_id += 1;
            Ok(MessageId(self.next_id))
        } else {
            Err(ChannelError::Send("rejected".into()))
        }
    }

    async fn close(&mut self) -> std::result::Result<(), ChannelError> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct MockConsumer {
    script: Script,
    payload: Vec<u8>,
    next_id: u64,
    pub counters: Calls,
}

impl MockConsumer {
    pub fn always(step: Step, payload: &[u8]) -> Self {
        Self::scripted(std::iter::empty(), step, payload)
    }

    pub fn scripted(steps: impl IntoIterator<Item = Step>, fallback: Step, payload: &[u8]) -> Self {
        let script = Script { steps: steps.into_iter().collect(), fallback };
        Self { script, payload: payload.to_vec(), next_id: 0, counters: Calls::default() }
    }
}

#[async_trait]
impl MessageConsumer for MockConsumer {
    async fn receive(&mut self) -> std::result::Result<Message, ChannelError> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        if self.script.next().play().await {
            self.next_id += 1;
            Ok(Message { id: MessageId(self.next_id), payload: self.payload.clone() })
        } else {
            Err(ChannelError::Receive("broken".into()))
        }
    }

    async fn close(&mut self) -> std::result::Result<(), ChannelError> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out producers but refuses every subscription.
#[derive(Debug, Default)]
pub(crate) struct RefusingBroker {
    pub producer: Calls,
    pub closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Broker for RefusingBroker {
    type Producer = MockProducer;
    type Consumer = MockConsumer;

    async fn create_producer(&self, _opts: &ProducerOptions) -> Result<MockProducer> {
        let mut producer = MockProducer::always(Step::Ok(ms(1)));
        producer.counters = self.producer.clone();
        Ok(producer)
    }

    async fn subscribe(&self, _opts: &ConsumerOptions) -> Result<MockConsumer> {
        Err(Error::Connect { what: "consumer", reason: "nope".into() })
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
