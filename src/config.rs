//! The YAML configuration file.
//!
//! ```yaml
//! Config:
//!   Pulsar_Connection:
//!     Url: memory://local
//!     Auth_Certificate: ""
//!     Auth_Key: ""
//!   Test_Parameters:
//!     Parallel_Test: false
//!     Multithread_Test: true
//!     Receive_Timeout: 5s
//!     Producer_Parameters:
//!       Producer_Topic: TOPIC-A
//!       Producer_Name: producer-1
//!       Produce_Quantity: 100
//!       Payload: hello world
//!     Consumer_Parameters:
//!       Consumer_Topic: TOPIC-A
//!       Subscription_Name: sub_test
//!       Consumer_Name: consumer-1
//!       Consume_Quantity: 100
//! ```
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Deserializer};

use crate::{
    broker::{ConnectionOptions, ConsumerOptions, ProducerOptions},
    error::{Error, Result},
    plan::{Mode, TestPlan},
};

/// Default config file path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config_test_file.yml";

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "Config")]
    config: ConfigOptions,
}

/// All options of a load test.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigOptions {
    /// How to reach the broker.
    #[serde(rename = "Pulsar_Connection")]
    pub connection: ConnectionSection,
    /// Mode flags and both roles.
    #[serde(rename = "Test_Parameters")]
    pub test: TestSection,
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionSection {
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "Auth_Certificate")]
    pub auth_certificate: String,
    #[serde(rename = "Auth_Key")]
    pub auth_key: String,
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TestSection {
    #[serde(rename = "Parallel_Test")]
    pub parallel_test: bool,
    #[serde(rename = "Multithread_Test")]
    pub multithread_test: bool,
    #[serde(rename = "Receive_Timeout", deserialize_with = "humantime_opt")]
    pub receive_timeout: Option<Duration>,
    #[serde(rename = "Producer_Parameters")]
    pub producer: ProducerSection,
    #[serde(rename = "Consumer_Parameters")]
    pub consumer: ConsumerSection,
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProducerSection {
    #[serde(rename = "Producer_Topic")]
    pub topic: String,
    #[serde(rename = "Producer_Name")]
    pub name: String,
    #[serde(rename = "Produce_Quantity")]
    pub quantity: u64,
    #[serde(rename = "Payload")]
    pub payload: String,
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsumerSection {
    #[serde(rename = "Consumer_Topic")]
    pub topic: String,
    #[serde(rename = "Subscription_Name")]
    pub subscription: String,
    #[serde(rename = "Consumer_Name")]
    pub name: String,
    #[serde(rename = "Consume_Quantity")]
    pub quantity: u64,
}

fn humantime_opt<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Duration>, D::Error> {
    match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => humantime::parse_duration(s.trim()).map(Some).map_err(serde::de::Error::custom),
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

/// Read and parse a config file.
pub fn load_file(path: &Path) -> Result<ConfigOptions> {
    let content =
        std::fs::read_to_string(path).map_err(|source| Error::ReadConfig { path: path.to_path_buf(), source })?;
    parse(&content).map_err(|source| Error::ParseConfig { path: path.to_path_buf(), source })
}

fn parse(content: &str) -> std::result::Result<ConfigOptions, serde_yaml::Error> {
    serde_yaml::from_str::<ConfigFile>(content).map(|f| f.config)
}

impl FromStr for ConfigOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s).map_err(|source| Error::ParseConfig { path: PathBuf::from("<inline>"), source })
    }
}

impl ConfigOptions {
    /// The mode selected by the two test flags.
    pub fn mode(&self) -> Mode {
        Mode::select(self.test.parallel_test, self.test.multithread_test)
    }

    /// Build the test plan.
    pub fn test_plan(&self) -> Result<TestPlan> {
        let plan = TestPlan::new(
            self.test.producer.quantity,
            self.test.consumer.quantity,
            self.test.producer.payload.as_bytes(),
            self.mode(),
        )?;
        Ok(plan.with_receive_timeout(self.test.receive_timeout))
    }

    /// Build the broker connection options.
    pub fn connection_options(&self) -> Result<ConnectionOptions> {
        let c = &self.connection;
        ConnectionOptions::new(
            c.url.clone(),
            non_empty(&c.auth_certificate).map(PathBuf::from),
            non_empty(&c.auth_key).map(PathBuf::from),
        )
    }

    /// Build the producer options.
    pub fn producer_options(&self) -> Result<ProducerOptions> {
        let p = &self.test.producer;
        ProducerOptions::new(p.topic.clone(), non_empty(&p.name))
    }

    /// Build the consumer options.
    pub fn consumer_options(&self) -> Result<ConsumerOptions> {
        let c = &self.test.consumer;
        ConsumerOptions::new(c.topic.clone(), c.subscription.clone(), non_empty(&c.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
Config:
  Pulsar_Connection:
    Url: "pulsar+ssl://localhost:6651"
    Auth_Certificate: PULSAR_BROKER_CLIENT.cert.pem
    Auth_Key: PULSAR_BROKER_CLIENT.key.p8
  Test_Parameters:
    Parallel_Test: true
    Multithread_Test: false
    Receive_Timeout: 250ms
    Producer_Parameters:
      Producer_Topic: TOPIC-A
      Producer_Name: ""
      Produce_Quantity: 10
      Payload: hello world
    Consumer_Parameters:
      Consumer_Topic: TOPIC-A
      Subscription_Name: sub_test
      Consumer_Name: c1
      Consume_Quantity: 8
"#;

    #[test]
    fn parse_full_config() {
        let cfg: ConfigOptions = FULL.parse().unwrap();
        assert_eq!(cfg.mode(), Mode::PhaseParallel);

        let plan = cfg.test_plan().unwrap();
        assert_eq!(plan.produce_count(), 10);
        assert_eq!(plan.consume_count(), 8);
        assert_eq!(plan.payload(), b"hello world");
        assert_eq!(plan.receive_timeout(), Some(Duration::from_millis(250)));

        let conn = cfg.connection_options().unwrap();
        assert_eq!(conn.scheme(), Some("pulsar+ssl"));
        assert!(conn.auth.is_some());

        assert_eq!(cfg.producer_options().unwrap().name, None);
        let consumer = cfg.consumer_options().unwrap();
        assert_eq!(consumer.subscription, "sub_test");
        assert_eq!(consumer.name.as_deref(), Some("c1"));
    }

    #[test]
    fn missing_sections_fail_validation() {
        let cfg: ConfigOptions = "Config:\n  Test_Parameters:\n    Multithread_Test: true\n".parse().unwrap();
        assert_eq!(cfg.mode(), Mode::Concurrent);
        assert_eq!(cfg.test.receive_timeout, None);
        assert!(matches!(cfg.test_plan(), Err(Error::InvalidPlan(_))));
        assert!(matches!(cfg.connection_options(), Err(Error::EmptyUrl)));
        assert!(matches!(cfg.producer_options(), Err(Error::EmptyTopic)));
        assert!(matches!(cfg.consumer_options(), Err(Error::EmptyTopic)));
    }

    #[test]
    fn rejects_bad_timeout() {
        let err = "Config:\n  Test_Parameters:\n    Receive_Timeout: soon\n"
            .parse::<ConfigOptions>()
            .unwrap_err();
        assert!(matches!(err, Error::ParseConfig { .. }));
    }

    #[test]
    fn load_missing_file() {
        let path = std::env::temp_dir().join("brokerload-does-not-exist.yml");
        assert!(matches!(load_file(&path), Err(Error::ReadConfig { .. })));
    }

    #[test]
    fn load_from_disk() {
        let path = std::env::temp_dir().join(format!("brokerload-config-{}.yml", std::process::id()));
        std::fs::write(&path, FULL).unwrap();
        let cfg = load_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(cfg.test.producer.quantity, 10);
    }
}
