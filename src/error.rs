//! Setup-tier errors.
//!
//! Anything in here aborts a run before the first iteration. Failures of
//! individual sends and receives are [`ChannelError`](crate::channel::ChannelError)s
//! and end up in the result accumulators instead.
use std::path::PathBuf;

use thiserror::Error;

/// Result type for setup-tier operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors which prevent a load test from starting.
#[derive(Debug, Error)]
pub enum Error {
    /// The broker URL is missing.
    #[error("empty URL")]
    EmptyUrl,

    /// The broker URL names a scheme no adapter is available for.
    #[error("unsupported broker URL '{url}'")]
    UnsupportedScheme {
        /// The offending URL.
        url: String,
    },

    /// Only one half of the TLS key pair was configured.
    #[error("TLS authentication needs both a certificate and a key")]
    IncompleteAuth,

    /// A producer or consumer topic is missing.
    #[error("empty topic")]
    EmptyTopic,

    /// The consumer subscription name is missing.
    #[error("empty subscription name")]
    EmptySubscription,

    /// The broker refused to create a producer or consumer.
    #[error("failed to connect to {what}: {reason}")]
    Connect {
        /// What was being created.
        what: &'static str,
        /// Why the broker refused.
        reason: String,
    },

    /// The test parameters are not runnable.
    #[error("invalid test plan: {0}")]
    InvalidPlan(&'static str),

    /// The configuration file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    ReadConfig {
        /// Path of the config file.
        path: PathBuf,
        /// The underlying io error.
        source: std::io::Error,
    },

    /// The configuration file is not valid.
    #[error("failed to parse config file {path:?}: {source}")]
    ParseConfig {
        /// Path of the config file.
        path: PathBuf,
        /// The underlying parse error.
        source: serde_yaml::Error,
    },

    /// One of the role tasks of a concurrent run did not complete.
    #[error("{role} task failed: {source}")]
    Task {
        /// The role the task was driving.
        role: &'static str,
        /// The join error.
        source: tokio::task::JoinError,
    },
}
