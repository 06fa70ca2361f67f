//! Cancellable fixed-interval retry.

use std::fmt::Display;
use std::future::Future;

use edge_telemetry::log_event;

use super::shutdown::ShutdownListener;
use super::SUBSYSTEM;
use crate::domain::{DiscoveryError, DiscoveryResult, RetryPolicy};

/// Run `op` until it succeeds.
///
/// `op` receives the 1-based attempt number. Between failures the helper
/// sleeps for `policy.interval`, returning [`DiscoveryError::Cancelled`] as
/// soon as the shutdown listener fires and
/// [`DiscoveryError::RetriesExhausted`] once a bounded policy runs out.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    shutdown: &mut ShutdownListener,
    what: &'static str,
    mut op: F,
) -> DiscoveryResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;

    loop {
        if shutdown.is_triggered() {
            return Err(DiscoveryError::Cancelled);
        }

        attempt = attempt.saturating_add(1);
        let error = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        log_event!(warn, SUBSYSTEM, "Attempt failed, retrying", operation = what, attempt, error = %error);

        if let Some(max) = policy.max_attempts {
            if attempt >= max {
                return Err(DiscoveryError::RetriesExhausted {
                    attempts: attempt,
                    last_error: error.to_string(),
                });
            }
        }

        tokio::select! {
            _ = shutdown.triggered() => return Err(DiscoveryError::Cancelled),
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::shutdown::ShutdownSignal;
    use std::time::Duration;

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let signal = ShutdownSignal::new();
        let mut listener = signal.listener();
        let policy = RetryPolicy::unbounded(Duration::from_millis(1));

        let value = retry_with_backoff(policy, &mut listener, "test", |attempt| async move {
            if attempt < 3 {
                Err("not yet")
            } else {
                Ok(attempt)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_bounded_policy_gives_up() {
        let signal = ShutdownSignal::new();
        let mut listener = signal.listener();
        let policy = RetryPolicy::bounded(Duration::from_millis(1), 2);

        let err = retry_with_backoff(policy, &mut listener, "test", |_| async {
            Err::<(), _>("still down")
        })
        .await
        .unwrap_err();

        assert_eq!(
            err,
            DiscoveryError::RetriesExhausted {
                attempts: 2,
                last_error: "still down".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_shutdown_cancels_wait() {
        let signal = ShutdownSignal::new();
        let mut listener = signal.listener();
        let policy = RetryPolicy::unbounded(Duration::from_secs(3600));

        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger();
        });

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            retry_with_backoff(policy, &mut listener, "test", |_| async {
                Err::<(), _>("down")
            }),
        )
        .await
        .expect("retry should stop on shutdown")
        .unwrap_err();

        assert_eq!(err, DiscoveryError::Cancelled);
    }
}
