//! C4.5 — a clock-driven repeating timer (spec §4.5, interface only).

use std::convert::Infallible;
use std::time::{Duration, Instant};

use crate::clock::SharedClock;
use crate::iterator::{Advance, AdvanceFuture, AsyncIterator};
use crate::support::CancellationHandle;

/// An [`AsyncIterator`] that produces an [`Instant`] every `interval`,
/// driven by a [`SharedClock`]. Never fails; cancellation simply ends it.
///
/// Each `advance` computes its deadline from the clock's current `now` at
/// the moment it is called, rather than from a fixed schedule anchored at
/// construction — so a consumer that falls behind sees ticks spaced
/// `interval` apart from when it actually asks, instead of a backlog of
/// catch-up ticks.
pub struct RepeatingTimer {
    clock: SharedClock,
    interval: Duration,
    tolerance: Option<Duration>,
    cancel: CancellationHandle,
}

impl RepeatingTimer {
    pub fn new(clock: SharedClock, interval: Duration, tolerance: Option<Duration>) -> Self {
        Self {
            clock,
            interval,
            tolerance,
            cancel: CancellationHandle::new(),
        }
    }
}

impl AsyncIterator for RepeatingTimer {
    type Item = Instant;
    type Failure = Infallible;

    fn advance(&mut self) -> AdvanceFuture<'_, Instant, Infallible> {
        Box::pin(async move {
            let deadline = self.clock.now() + self.interval;
            let token = self.cancel.token();
            match self.clock.sleep_until(deadline, self.tolerance, &token).await {
                Ok(()) => Advance::Value(self.clock.now()),
                Err(_) => Advance::End,
            }
        })
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
