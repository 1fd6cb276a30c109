use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// A shared, type-erased [`Clock`]. Trait objects do not automatically
/// inherit their trait's `Send + Sync` supertraits, so every site that
/// stores a `dyn Clock` spells the auto traits out explicitly.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Raised when a `sleep_until` call is cancelled before its deadline.
#[derive(Debug, thiserror::Error)]
#[error("clock sleep cancelled")]
pub struct SleepCancelled;

/// The clock contract consumed by [`crate::debounce`] and [`crate::timer`]
/// (spec §3 "Clock", §6 "Clock contract").
///
/// `sleep_until` may be woken any time at or after `deadline`, but MUST NOT
/// return before it; implementations may coalesce wake-ups within
/// `tolerance` of the deadline.
pub trait Clock: Send + Sync + 'static {
    /// The current instant, per this clock.
    fn now(&self) -> Instant;

    /// The smallest duration this clock can reliably distinguish.
    fn minimum_resolution(&self) -> Duration;

    /// Suspend the caller until `deadline`, fallible on cancellation.
    fn sleep_until<'a>(
        &'a self,
        deadline: Instant,
        tolerance: Option<Duration>,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), SleepCancelled>> + Send + 'a>>;
}

/// A [`Clock`] backed by the Tokio runtime's real-time timer wheel.
///
/// This is the crate's default clock; embedders that need virtual time
/// (e.g. for deterministic tests) provide their own [`Clock`] impl instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn minimum_resolution(&self) -> Duration {
        Duration::from_millis(1)
    }

    fn sleep_until<'a>(
        &'a self,
        deadline: Instant,
        tolerance: Option<Duration>,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), SleepCancelled>> + Send + 'a>> {
        // Tolerance only widens how early the tick may coalesce; real-time
        // sleeps here always target the exact deadline since tokio's timer
        // wheel already batches wake-ups within its own resolution.
        let _ = tolerance;
        Box::pin(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline.into()) => Ok(()),
                _ = cancel.cancelled() => Err(SleepCancelled),
            }
        })
    }
}
