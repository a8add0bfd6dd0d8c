//! Timeout and retry policy wrapped around every collaborator call.
//!
//! Reads are retried on transient failure with exponential backoff plus
//! jitter. Writes get a single attempt; the user retries them by hand.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::BackendError;

#[derive(Debug, Clone)]
pub struct RequestPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            base_backoff: Duration::from_millis(250),
        }
    }
}

impl RequestPolicy {
    /// Run a read-only call, retrying transient failures.
    ///
    /// `call` is invoked once per attempt so that each retry issues a fresh
    /// request.
    pub async fn read<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut attempt = 0u32;
        loop {
            match self.attempt(operation, call()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Read failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(operation, error = %e, "Read failed");
                    return Err(e);
                }
            }
        }
    }

    /// Run a mutating call exactly once under the timeout.
    pub async fn write<T, Fut>(&self, operation: &'static str, fut: Fut) -> Result<T, BackendError>
    where
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let result = self.attempt(operation, fut).await;
        if let Err(e) = &result {
            tracing::warn!(operation, error = %e, "Write failed");
        }
        result
    }

    /// Delay before retry number `attempt + 1`: `base * 2^attempt` plus up
    /// to 50% jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self
            .base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(16)));
        let max_jitter = (base.as_millis() / 2) as u64;
        let jitter = if max_jitter == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=max_jitter)
        };
        base + Duration::from_millis(jitter)
    }

    async fn attempt<T, Fut>(&self, operation: &'static str, fut: Fut) -> Result<T, BackendError>
    where
        Fut: Future<Output = Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                operation,
                after: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RequestPolicy {
        RequestPolicy {
            timeout: Duration::from_millis(50),
            max_retries: 2,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn read_retries_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = fast()
            .read("fetch", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(BackendError::Unavailable("flaky".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn read_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .read("fetch", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BackendError::Unavailable("down".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn read_does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .read("fetch", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BackendError::Rejected("no".into())) }
            })
            .await;
        assert_eq!(result, Err(BackendError::Rejected("no".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn write_is_attempted_once() {
        let calls = AtomicU32::new(0);
        let policy = fast();
        let result: Result<(), _> = policy
            .write("send", async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Unavailable("down".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let policy = RequestPolicy {
            max_retries: 0,
            ..fast()
        };
        let result: Result<(), _> = policy
            .write("send", async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(BackendError::Timeout { operation: "send", .. })
        ));
    }

    #[test]
    fn backoff_doubles_with_bounded_jitter() {
        let policy = RequestPolicy {
            base_backoff: Duration::from_millis(100),
            ..RequestPolicy::default()
        };
        for _ in 0..20 {
            let first = policy.backoff(0);
            assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));
            let third = policy.backoff(2);
            assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(600));
        }
    }
}
