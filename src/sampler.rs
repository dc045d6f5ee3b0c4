//! Times a single channel operation.
use std::future::Future;

use tokio::time::{Duration, Instant};

/// The result of one timed send or receive.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationOutcome {
    /// Wall-clock time the operation took, on either path.
    pub duration: Duration,
    /// Whether the operation succeeded.
    pub succeeded: bool,
    /// Bytes moved by the operation. Zero for failures.
    pub payload_size: u64,
    /// The error message of a failed operation.
    pub error: Option<String>,
}

/// Run `op` and time it.
///
/// The clock starts right before the operation is polled and stops right
/// after it returns, so failures contribute their time too. `size` maps a
/// successful value to the number of payload bytes it moved.
pub async fn sample<T, E, F>(op: F, size: impl FnOnce(&T) -> u64) -> (Result<T, E>, OperationOutcome)
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let res = op.await;
    let duration = start.elapsed();

    let outcome = match &res {
        Ok(v) => OperationOutcome { duration, succeeded: true, payload_size: size(v), error: None },
        Err(e) => OperationOutcome { duration, succeeded: false, payload_size: 0, error: Some(e.to_string()) },
    };
    (res, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelError;

    #[tokio::test(start_paused = true)]
    async fn times_success() {
        let (res, outcome) = sample(
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, ChannelError>(vec![1u8, 2, 3])
            },
            |v| v.len() as u64,
        )
        .await;

        assert_eq!(res.unwrap().len(), 3);
        assert!(outcome.succeeded);
        assert_eq!(outcome.duration, Duration::from_millis(10));
        assert_eq!(outcome.payload_size, 3);
        assert_eq!(outcome.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn times_failure() {
        let (res, outcome) = sample(
            async {
                tokio::time::sleep(Duration::from_millis(7)).await;
                Err::<Vec<u8>, _>(ChannelError::Closed)
            },
            |v| v.len() as u64,
        )
        .await;

        assert!(res.is_err());
        assert!(!outcome.succeeded);
        assert_eq!(outcome.duration, Duration::from_millis(7));
        assert_eq!(outcome.payload_size, 0);
        assert_eq!(outcome.error.as_deref(), Some("channel closed"));
    }
}
