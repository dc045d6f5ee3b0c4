//! An in-process loopback broker.
//!
//! [`MemoryBroker`] keeps topics and subscriptions in memory and is addressed
//! with a `memory://<name>` URL. A send fans out to every subscription of the
//! topic that exists at the time of sending; a receive waits for the next
//! message of its subscription and takes it off the backlog, which is the
//! acknowledgement. Nothing is redelivered.
//!
//! It exists so the harness can be exercised end to end without an external
//! broker, and so the engine has a real adapter to run against in tests.
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::{ChannelError, Message, MessageConsumer, MessageId, MessageProducer};
use crate::{
    broker::{Broker, ConnectionOptions, ConsumerOptions, ProducerOptions},
    error::{Error, Result},
};

/// URL scheme handled by [`MemoryBroker`].
pub const SCHEME: &str = "memory";

/// A loopback broker living in the current process.
#[derive(Clone, Debug)]
pub struct MemoryBroker {
    inner: Arc<BrokerInner>,
}

#[derive(Debug)]
struct BrokerInner {
    name: String,
    topics: Mutex<HashMap<String, Arc<Topic>>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

#[derive(Debug, Default)]
struct Topic {
    subscriptions: Mutex<HashMap<String, Arc<Subscription>>>,
}

#[derive(Debug, Default)]
struct Subscription {
    state: Mutex<SubscriptionState>,
    available: Notify,
}

#[derive(Debug, Default)]
struct SubscriptionState {
    backlog: VecDeque<Message>,
    closed: bool,
}

impl MemoryBroker {
    /// Create a new, empty broker with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let inner = BrokerInner {
            name: name.into(),
            topics: Mutex::default(),
            next_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        };
        Self { inner: Arc::new(inner) }
    }

    /// Connect to a `memory://<name>` URL.
    pub fn connect(opts: &ConnectionOptions) -> Result<Self> {
        match opts.url.split_once("://") {
            Some((SCHEME, name)) => {
                #[cfg(feature = "tracing")]
                if opts.auth.is_some() {
                    log::debug!("memory broker '{name}' ignores TLS authentication");
                }
                Ok(Self::new(name))
            }
            _ => Err(Error::UnsupportedScheme { url: opts.url.clone() }),
        }
    }

    /// Name of this broker.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of messages waiting in a subscription, or `None` if it does not exist.
    pub fn backlog(&self, topic: &str, subscription: &str) -> Option<usize> {
        let topic = self.inner.topics.lock().get(topic).cloned()?;
        let sub = topic.subscriptions.lock().get(subscription).cloned()?;
        let len = sub.state.lock().backlog.len();
        Some(len)
    }

    fn topic(&self, name: &str) -> Arc<Topic> {
        self.inner.topics.lock().entry(name.to_owned()).or_default().clone()
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    type Producer = MemoryProducer;
    type Consumer = MemoryConsumer;

    async fn create_producer(&self, opts: &ProducerOptions) -> Result<MemoryProducer> {
        if self.is_closed() {
            return Err(Error::Connect { what: "producer", reason: "broker closed".into() });
        }
        Ok(MemoryProducer {
            broker: self.clone(),
            topic: self.topic(&opts.topic),
            name: opts.name.clone(),
            closed: false,
        })
    }

    async fn subscribe(&self, opts: &ConsumerOptions) -> Result<MemoryConsumer> {
        if self.is_closed() {
            return Err(Error::Connect { what: "consumer", reason: "broker closed".into() });
        }
        let sub = self
            .topic(&opts.topic)
            .subscriptions
            .lock()
            .entry(opts.subscription.clone())
            .or_default()
            .clone();
        Ok(MemoryConsumer { sub, name: opts.name.clone(), closed: false })
    }

    async fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let topics = self.inner.topics.lock().values().cloned().collect::<Vec<_>>();
        for topic in topics {
            let subs = topic.subscriptions.lock().values().cloned().collect::<Vec<_>>();
            for sub in subs {
                sub.state.lock().closed = true;
                sub.available.notify_waiters();
            }
        }
    }
}

/// Producer half of a [`MemoryBroker`] topic.
#[derive(Debug)]
pub struct MemoryProducer {
    broker: MemoryBroker,
    topic: Arc<Topic>,
    name: Option<String>,
    closed: bool,
}

impl MemoryProducer {
    /// The configured producer name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[async_trait]
impl MessageProducer for MemoryProducer {
    async fn send(&mut self, payload: &[u8]) -> Result<MessageId, ChannelError> {
        if self.closed || self.broker.is_closed() {
            return Err(ChannelError::Closed);
        }
        let id = MessageId(self.broker.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let subs = self.topic.subscriptions.lock().values().cloned().collect::<Vec<_>>();
        for sub in subs {
            let mut state = sub.state.lock();
            if state.closed {
                continue;
            }
            state.backlog.push_back(Message { id, payload: payload.to_vec() });
            drop(state);
            sub.available.notify_one();
        }
        Ok(id)
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.closed = true;
        Ok(())
    }
}

/// Consumer half of a [`MemoryBroker`] subscription.
#[derive(Debug)]
pub struct MemoryConsumer {
    sub: Arc<Subscription>,
    name: Option<String>,
    closed: bool,
}

impl MemoryConsumer {
    /// The configured consumer name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

#[async_trait]
impl MessageConsumer for MemoryConsumer {
    async fn receive(&mut self) -> Result<Message, ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        loop {
            // Register interest before checking the backlog so a close in
            // between is not missed.
            let notified = self.sub.available.notified();
            {
                let mut state = self.sub.state.lock();
                if let Some(msg) = state.backlog.pop_front() {
                    return Ok(msg);
                }
                if state.closed {
                    return Err(ChannelError::Closed);
                }
            }
            notified.await;
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn pair(broker: &MemoryBroker) -> (MemoryProducer, MemoryConsumer) {
        let producer = broker
            .create_producer(&ProducerOptions::new("TOPIC-A", None).unwrap())
            .await
            .unwrap();
        let consumer = broker
            .subscribe(&ConsumerOptions::new("TOPIC-A", "sub_test", None).unwrap())
            .await
            .unwrap();
        (producer, consumer)
    }

    #[test]
    fn connect_by_url() {
        let opts = ConnectionOptions::new("memory://local", None, None).unwrap();
        assert_eq!(MemoryBroker::connect(&opts).unwrap().name(), "local");

        let opts = ConnectionOptions::new("pulsar+ssl://localhost:6651", None, None).unwrap();
        assert!(matches!(MemoryBroker::connect(&opts), Err(Error::UnsupportedScheme { .. })));
    }

    #[tokio::test]
    async fn send_then_receive() {
        let broker = MemoryBroker::new("test");
        let (mut producer, mut consumer) = pair(&broker).await;

        let a = producer.send(b"hello").await.unwrap();
        let b = producer.send(b"world").await.unwrap();
        assert!(a < b);
        assert_eq!(broker.backlog("TOPIC-A", "sub_test"), Some(2));

        let msg = consumer.receive().await.unwrap();
        assert_eq!(msg, Message { id: a, payload: b"hello".to_vec() });
        assert_eq!(consumer.receive().await.unwrap().payload, b"world");
        assert_eq!(broker.backlog("TOPIC-A", "sub_test"), Some(0));
    }

    #[tokio::test]
    async fn fan_out_to_subscriptions() {
        let broker = MemoryBroker::new("test");
        let (mut producer, _c1) = pair(&broker).await;
        let _c2 = broker
            .subscribe(&ConsumerOptions::new("TOPIC-A", "other", None).unwrap())
            .await
            .unwrap();

        producer.send(b"x").await.unwrap();
        assert_eq!(broker.backlog("TOPIC-A", "sub_test"), Some(1));
        assert_eq!(broker.backlog("TOPIC-A", "other"), Some(1));
        assert_eq!(broker.backlog("TOPIC-B", "other"), None);
    }

    #[tokio::test]
    async fn receive_waits_for_send() {
        let broker = MemoryBroker::new("test");
        let (mut producer, mut consumer) = pair(&broker).await;

        let recv = tokio::spawn(async move { consumer.receive().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!recv.is_finished());

        producer.send(b"late").await.unwrap();
        assert_eq!(recv.await.unwrap().unwrap().payload, b"late");
    }

    #[tokio::test]
    async fn close_fails_pending_receive() {
        let broker = MemoryBroker::new("test");
        let (_producer, mut consumer) = pair(&broker).await;

        let recv = tokio::spawn(async move { consumer.receive().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        broker.close().await;

        assert_eq!(recv.await.unwrap(), Err(ChannelError::Closed));
        assert!(broker.create_producer(&ProducerOptions::new("t", None).unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn closed_halves_reject_operations() {
        let broker = MemoryBroker::new("test");
        let (mut producer, mut consumer) = pair(&broker).await;

        producer.close().await.unwrap();
        consumer.close().await.unwrap();
        assert_eq!(producer.send(b"x").await, Err(ChannelError::Closed));
        assert_eq!(consumer.receive().await, Err(ChannelError::Closed));
    }

    #[tokio::test]
    async fn received_messages_are_not_redelivered() {
        let broker = MemoryBroker::new("test");
        let (mut producer, mut consumer) = pair(&broker).await;

        producer.send(b"first").await.unwrap();
        producer.send(b"second").await.unwrap();
        assert_eq!(consumer.receive().await.unwrap().payload, b"first");
        consumer.close().await.unwrap();
        assert_eq!(broker.backlog("TOPIC-A", "sub_test"), Some(1));

        let mut next = broker
            .subscribe(&ConsumerOptions::new("TOPIC-A", "sub_test", None).unwrap())
            .await
            .unwrap();
        assert_eq!(next.receive().await.unwrap().payload, b"second");
        assert_eq!(broker.backlog("TOPIC-A", "sub_test"), Some(0));
    }
}
