//! Broker setup: connection options and the factory for channel halves.
//!
//! Options are plain values handed to the adapter when it is created, so two
//! runs in the same process never share connection state.
use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    channel::{MessageConsumer, MessageProducer},
    error::{Error, Result},
};

/// TLS client authentication material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsAuth {
    /// Path of the client certificate.
    pub certificate: PathBuf,
    /// Path of the client private key.
    pub key: PathBuf,
}

/// How to reach the broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Broker service URL.
    pub url: String,
    /// Optional TLS authentication.
    pub auth: Option<TlsAuth>,
}

impl ConnectionOptions {
    /// Create connection options, rejecting an empty URL or half a key pair.
    pub fn new(url: impl Into<String>, certificate: Option<PathBuf>, key: Option<PathBuf>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::EmptyUrl);
        }
        let auth = match (certificate, key) {
            (Some(certificate), Some(key)) => Some(TlsAuth { certificate, key }),
            (None, None) => None,
            _ => return Err(Error::IncompleteAuth),
        };
        Ok(Self { url, auth })
    }

    /// The URL scheme, e.g. `memory` for `memory://local`.
    pub fn scheme(&self) -> Option<&str> {
        self.url.split_once("://").map(|(scheme, _)| scheme)
    }
}

/// Producer creation options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProducerOptions {
    /// Topic the producer publishes to.
    pub topic: String,
    /// Optional producer name.
    pub name: Option<String>,
}

impl ProducerOptions {
    /// Create producer options, rejecting an empty topic.
    pub fn new(topic: impl Into<String>, name: Option<String>) -> Result<Self> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(Error::EmptyTopic);
        }
        Ok(Self { topic, name: name.filter(|n| !n.is_empty()) })
    }
}

/// Consumer creation options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerOptions {
    /// Topic the consumer subscribes to.
    pub topic: String,
    /// Subscription the consumer joins.
    pub subscription: String,
    /// Optional consumer name.
    pub name: Option<String>,
}

impl ConsumerOptions {
    /// Create consumer options, rejecting an empty topic or subscription.
    pub fn new(topic: impl Into<String>, subscription: impl Into<String>, name: Option<String>) -> Result<Self> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(Error::EmptyTopic);
        }
        let subscription = subscription.into();
        if subscription.is_empty() {
            return Err(Error::EmptySubscription);
        }
        Ok(Self { topic, subscription, name: name.filter(|n| !n.is_empty()) })
    }
}

/// A connected broker client that hands out producers and consumers.
#[async_trait]
pub trait Broker: Send + Sync {
    /// The producer type of this broker.
    type Producer: MessageProducer + 'static;
    /// The consumer type of this broker.
    type Consumer: MessageConsumer + 'static;

    /// Create a producer for the given topic.
    async fn create_producer(&self, opts: &ProducerOptions) -> Result<Self::Producer>;

    /// Subscribe a consumer to the given topic.
    async fn subscribe(&self, opts: &ConsumerOptions) -> Result<Self::Consumer>;

    /// Close the client. Producers and consumers are closed separately.
    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_options_validation() {
        assert!(matches!(ConnectionOptions::new("", None, None), Err(Error::EmptyUrl)));
        assert!(matches!(
            ConnectionOptions::new("memory://a", Some("cert.pem".into()), None),
            Err(Error::IncompleteAuth)
        ));

        let opts = ConnectionOptions::new("memory://a", Some("c.pem".into()), Some("k.p8".into())).unwrap();
        assert_eq!(opts.scheme(), Some("memory"));
        assert_eq!(opts.auth.unwrap().key, PathBuf::from("k.p8"));

        let opts = ConnectionOptions::new("localhost:6650", None, None).unwrap();
        assert_eq!(opts.scheme(), None);
    }

    #[test]
    fn channel_options_validation() {
        assert!(matches!(ProducerOptions::new("", None), Err(Error::EmptyTopic)));
        assert!(matches!(ConsumerOptions::new("", "sub", None), Err(Error::EmptyTopic)));
        assert!(matches!(ConsumerOptions::new("t", "", None), Err(Error::EmptySubscription)));

        let opts = ProducerOptions::new("TOPIC-A", Some(String::new())).unwrap();
        assert_eq!(opts.name, None);
        let opts = ConsumerOptions::new("TOPIC-A", "sub_test", Some("c1".into())).unwrap();
        assert_eq!(opts.name.as_deref(), Some("c1"));
    }
}
