use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::backoff::Constant;
use backoff::Error as BackoffError;
use log::*;

/// Bounded fixed-delay retry used when first connecting to a node.
///
/// lnd may still be starting when we come up, so the first connection gets a
/// few chances. Calls made after a successful connection are never retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Make a policy; `attempts` is clamped to at least one
    pub fn new(attempts: u32, delay: Duration) -> Self {
        RetryPolicy { attempts: attempts.max(1), delay }
    }

    /// Total number of attempts, including the first
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pause between attempts
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(10, Duration::from_secs(1))
    }
}

/// Run `connect` until it succeeds or the policy's attempts are used up.
///
/// On exhaustion the error of the last attempt is returned.
pub async fn connect_with_retry<T, E, F, Fut>(policy: RetryPolicy, mut connect: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempt = AtomicU32::new(0);
    let op = || {
        let n = attempt.fetch_add(1, Ordering::Relaxed) + 1;
        let fut = connect();
        async move {
            fut.await.map_err(|e| {
                if n >= policy.attempts {
                    error!("connect attempt {}/{} failed, giving up: {}", n, policy.attempts, e);
                    BackoffError::permanent(e)
                } else {
                    BackoffError::transient(e)
                }
            })
        }
    };
    backoff::future::retry_notify(Constant::new(policy.delay), op, |e, _| {
        warn!(
            "connect attempt {}/{} failed, retrying in {:?}: {}",
            attempt.load(Ordering::Relaxed),
            policy.attempts,
            policy.delay,
            e
        );
    })
    .await
}
