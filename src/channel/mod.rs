//! The message channel capabilities the load test drives.
//!
//! A broker adapter provides one [`MessageProducer`] and one
//! [`MessageConsumer`]. The engine only ever sends, receives and closes;
//! everything else about the broker stays behind the adapter.
pub mod memory;

#[cfg(test)]
pub(crate) mod mock;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Identifier the broker assigned to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A message received from the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// The id the broker assigned when the message was sent.
    pub id: MessageId,
    /// The message body.
    pub payload: Vec<u8>,
}

impl Message {
    /// Length of the message body in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true if the message body is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Failure of a single send or receive.
///
/// These never abort a run. The engine times them and counts them as failed
/// iterations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The producer or consumer has been closed.
    #[error("channel closed")]
    Closed,

    /// The broker rejected the message.
    #[error("send failed: {0}")]
    Send(String),

    /// The broker failed to deliver a message.
    #[error("receive failed: {0}")]
    Receive(String),

    /// No message arrived within the configured receive timeout.
    #[error("receive timed out")]
    Timeout,
}

/// Sending half of a message channel.
#[async_trait]
pub trait MessageProducer: Send {
    /// Send one message and wait for the broker to accept it.
    async fn send(&mut self, payload: &[u8]) -> Result<MessageId, ChannelError>;

    /// Release the producer. Called exactly once, after the run.
    async fn close(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Receiving half of a message channel.
#[async_trait]
pub trait MessageConsumer: Send {
    /// Wait for the next message and acknowledge it before returning.
    ///
    /// There is no timeout here; the call returns when a message arrives or
    /// the channel fails.
    async fn receive(&mut self) -> Result<Message, ChannelError>;

    /// Release the consumer. Called exactly once, after the run.
    async fn close(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[async_trait]
impl<P: MessageProducer + ?Sized> MessageProducer for Box<P> {
    async fn send(&mut self, payload: &[u8]) -> Result<MessageId, ChannelError> {
        (**self).send(payload).await
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        (**self).close().await
    }
}

#[async_trait]
impl<C: MessageConsumer + ?Sized> MessageConsumer for Box<C> {
    async fn receive(&mut self) -> Result<Message, ChannelError> {
        (**self).receive().await
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        (**self).close().await
    }
}
