use std::sync::Arc;
use std::time::Duration;

use async_sequence_core::{
    Advance, AdvanceFuture, AsyncIterator, DebounceConfig, DebouncedIterator, SystemClock,
};

/// Emits each scripted element after sleeping its paired delay, then ends.
/// Built for use under `#[tokio::test(start_paused = true)]` so the delays
/// advance virtual time instead of real time.
struct ScriptedIterator {
    script: std::vec::IntoIter<(Duration, &'static str)>,
}

impl ScriptedIterator {
    fn new(script: Vec<(Duration, &'static str)>) -> Self {
        Self {
            script: script.into_iter(),
        }
    }
}

impl AsyncIterator for ScriptedIterator {
    type Item = &'static str;
    type Failure = ();

    fn advance(&mut self) -> AdvanceFuture<'_, &'static str, ()> {
        let next = self.script.next();
        Box::pin(async move {
            match next {
                Some((delay, value)) => {
                    tokio::time::sleep(delay).await;
                    Advance::Value(value)
                }
                None => Advance::End,
            }
        })
    }
}

#[tokio::test(start_paused = true)]
async fn coalesces_a_burst_into_its_last_element() {
    // Scenario 2 (spec §8): a, b arrive on consecutive ticks, then silence;
    // interval = 3 ticks. Only `b` is emitted, 3 ticks after it arrived.
    let tick = Duration::from_secs(1);
    let upstream = ScriptedIterator::new(vec![(tick, "a"), (tick, "b")]);
    let mut debounced = DebouncedIterator::new(
        upstream,
        DebounceConfig::new(tick * 3),
        Arc::new(SystemClock),
    );

    assert_eq!(debounced.advance().await.value(), Some("b"));
    assert!(debounced.advance().await.is_end());
}

#[tokio::test(start_paused = true)]
async fn upstream_end_emits_pending_element_then_end() {
    let tick = Duration::from_secs(1);
    let upstream = ScriptedIterator::new(vec![(tick, "last")]);
    let mut debounced = DebouncedIterator::new(
        upstream,
        DebounceConfig::new(tick * 3),
        Arc::new(SystemClock),
    );

    assert_eq!(debounced.advance().await.value(), Some("last"));
    assert!(debounced.advance().await.is_end());
}

/// Yields one value, then fails on the very next advance.
struct ValueThenFailure {
    sent: bool,
}

impl AsyncIterator for ValueThenFailure {
    type Item = &'static str;
    type Failure = &'static str;

    fn advance(&mut self) -> AdvanceFuture<'_, &'static str, &'static str> {
        let sent = std::mem::replace(&mut self.sent, true);
        Box::pin(async move {
            if sent {
                Advance::Failure("disk on fire")
            } else {
                Advance::Value("pending")
            }
        })
    }
}

#[tokio::test(start_paused = true)]
async fn upstream_failure_drops_the_pending_element() {
    // spec §8 "Upstream failure while an element is pending": the pending
    // element must never be emitted, and the failure is delivered instead.
    let upstream = ValueThenFailure { sent: false };
    let mut debounced = DebouncedIterator::new(
        upstream,
        DebounceConfig::new(Duration::from_secs(3)),
        Arc::new(SystemClock),
    );

    match debounced.advance().await {
        Advance::Failure(f) => assert_eq!(f, "disk on fire"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn no_pending_element_ends_immediately() {
    let upstream = ScriptedIterator::new(vec![]);
    let mut debounced = DebouncedIterator::new(
        upstream,
        DebounceConfig::new(Duration::from_secs(1)),
        Arc::new(SystemClock),
    );

    assert!(debounced.advance().await.is_end());
}
