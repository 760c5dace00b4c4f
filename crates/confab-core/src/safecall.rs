//! Failure containment for handler and driver calls.
//!
//! Every piece of user code the engine runs (trigger conditions, trigger
//! actions, reply continuations) and every outbound driver call goes through
//! this module. A failing or panicking handler produces a [`CallError`]
//! instead of unwinding into the dispatch loop.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use thiserror::Error;

/// The uniform failure produced by a contained call.
#[derive(Debug, Error)]
pub enum CallError {
    /// The wrapped operation returned an error.
    #[error("handler error: {0}")]
    Failed(#[from] anyhow::Error),

    /// The wrapped operation panicked; the payload is the panic message.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Runs a fallible handler future to completion, containing both error
/// returns and panics.
///
/// The future is polled exactly once to completion; it is never re-invoked
/// on failure.
pub async fn safe_call<T>(fut: impl Future<Output = anyhow::Result<T>>) -> Result<T, CallError> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(CallError::Failed(error)),
        Err(payload) => Err(CallError::Panicked(panic_text(payload))),
    }
}

/// Runs a future to completion, containing panics but passing the output
/// through untouched.
///
/// Used for driver calls, where the typed error must survive for the caller
/// to inspect (send failures are propagated, not swallowed).
pub async fn guard_panic<T>(fut: impl Future<Output = T>) -> Result<T, String> {
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(panic_text)
}

fn panic_text(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Bounded retry for lookups that may transiently report nothing.
///
/// Runs `op` up to `policy.attempts` times, sleeping `policy.delay` between
/// attempts, until it yields `Ok(Some(_))`. The final outcome is returned
/// as-is when every attempt comes up empty or failed.
pub async fn retry_lookup<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut last = op().await;
    for _ in 1..attempts {
        if matches!(last, Ok(Some(_))) {
            break;
        }
        tokio::time::sleep(policy.delay).await;
        last = op().await;
    }
    last
}

/// Attempt count and spacing for [`retry_lookup`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total number of attempts (minimum 1).
    pub attempts: u32,
    /// Delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// A single attempt with no delay.
    pub fn once() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn safe_call_passes_success_through() {
        let result = safe_call(async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn safe_call_contains_errors() {
        let result: Result<(), _> = safe_call(async { Err(anyhow::anyhow!("boom")) }).await;
        assert!(matches!(result, Err(CallError::Failed(_))));
    }

    #[tokio::test]
    async fn safe_call_contains_panics() {
        let result: Result<(), _> = safe_call(async { panic!("blew up") }).await;
        match result {
            Err(CallError::Panicked(text)) => assert_eq!(text, "blew up"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn guard_panic_keeps_typed_output() {
        let ok: Result<Result<u8, &str>, String> = guard_panic(async { Err("driver down") }).await;
        assert_eq!(ok.unwrap(), Err("driver down"));
    }

    #[tokio::test]
    async fn retry_lookup_stops_on_first_hit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<Option<u8>, ()> = retry_lookup(RetryPolicy::default(), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(1))
            }
        })
        .await;
        assert_eq!(result.unwrap(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_lookup_exhausts_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let policy = RetryPolicy {
            attempts: 3,
            delay: Duration::ZERO,
        };
        let result: Result<Option<u8>, ()> = retry_lookup(policy, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        })
        .await;
        assert_eq!(result.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
