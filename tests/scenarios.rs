//! The six marble-notation scenarios, one test each, matched to their
//! numbering.

use std::collections::HashSet;
use std::time::Duration;

use async_sequence_core::channel::channel;
use async_sequence_core::{
    make_iterator, Advance, AsyncIterator, BufferPolicy, BufferedIterator, DebounceConfig,
    DebouncedIterator, MergedIterator, SendOutcome, SystemClock,
};

#[tokio::test]
async fn scenario_1_buffer_transparent_at_zero() {
    let upstream = make_iterator::<_, ()>(['a', 'b', 'c']);
    let mut buffered = BufferedIterator::new(upstream, BufferPolicy::Bounded(0));

    for expected in ['a', 'b', 'c'] {
        assert_eq!(buffered.advance().await.value(), Some(expected));
    }
    assert!(buffered.advance().await.is_end());
}

#[tokio::test(start_paused = true)]
async fn scenario_2_debounce_coalesces_a_burst() {
    struct Burst(std::vec::IntoIter<(Duration, char)>);

    impl AsyncIterator for Burst {
        type Item = char;
        type Failure = ();

        fn advance(&mut self) -> async_sequence_core::AdvanceFuture<'_, char, ()> {
            let next = self.0.next();
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

    let tick = Duration::from_secs(1);
    let upstream = Burst(vec![(tick, 'a'), (tick, 'b')].into_iter());
    let mut debounced =
        DebouncedIterator::new(upstream, DebounceConfig::new(tick * 3), std::sync::Arc::new(SystemClock));

    assert_eq!(debounced.advance().await.value(), Some('b'));
    assert!(debounced.advance().await.is_end());
}

#[tokio::test]
async fn scenario_3_merge_interleaves_and_waits_for_both_ends() {
    let in1 = make_iterator::<_, ()>(['a', 'c']);
    let in2 = make_iterator::<_, ()>(['b', 'd']);
    let mut merged = MergedIterator::new2(in1, in2);

    let mut seen = HashSet::new();
    loop {
        match merged.advance().await {
            Advance::Value(v) => {
                seen.insert(v);
            }
            Advance::End => break,
            Advance::Failure(()) => unreachable!(),
        }
    }
    assert_eq!(seen, HashSet::from(['a', 'b', 'c', 'd']));
}

#[tokio::test]
async fn scenario_4_merge_fails_fast() {
    struct FailsImmediately;

    impl AsyncIterator for FailsImmediately {
        type Item = char;
        type Failure = &'static str;

        fn advance(&mut self) -> async_sequence_core::AdvanceFuture<'_, char, &'static str> {
            Box::pin(async { Advance::Failure("failed") })
        }
    }

    struct DelayedThenEnd(std::vec::IntoIter<char>);

    impl AsyncIterator for DelayedThenEnd {
        type Item = char;
        type Failure = &'static str;

        fn advance(&mut self) -> async_sequence_core::AdvanceFuture<'_, char, &'static str> {
            let next = self.0.next();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                match next {
                    Some(v) => Advance::Value(v),
                    None => Advance::End,
                }
            })
        }
    }

    let in1 = FailsImmediately;
    let in2 = DelayedThenEnd(vec!['c'].into_iter());
    let mut merged = MergedIterator::new2(in1, in2);

    let mut seen = HashSet::new();
    loop {
        match merged.advance().await {
            Advance::Value(v) => {
                seen.insert(v);
            }
            Advance::End => panic!("expected a failure, not end"),
            Advance::Failure(f) => {
                assert_eq!(f, "failed");
                break;
            }
        }
    }
    assert!(!seen.contains(&'c'), "c must never be emitted after the failure");
}

#[tokio::test]
async fn scenario_5_channel_rendezvous() {
    let (sender, mut receiver) = channel::<&'static str, ()>();

    let t1 = sender.clone();
    let send1 = tokio::spawn(async move { t1.send("x").await });
    tokio::task::yield_now().await;

    assert_eq!(receiver.advance().await.value(), Some("x"));
    assert_eq!(send1.await.unwrap(), SendOutcome::Delivered);

    let t2 = sender.clone();
    let send2 = tokio::spawn(async move { t2.send("y").await });
    tokio::task::yield_now().await;

    sender.finish();

    assert_eq!(send2.await.unwrap(), SendOutcome::Terminated);
    assert!(receiver.advance().await.is_end());
}

#[tokio::test]
async fn scenario_6_buffering_latest_drops_old_elements() {
    let upstream = make_iterator::<_, ()>([1, 2, 3, 4, 5]);
    let mut buffered = BufferedIterator::new(upstream, BufferPolicy::BufferingLatest(2));

    // Give the driver room to run ahead of this consumer before it asks
    // for anything, so all five elements have already arrived.
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(buffered.advance().await.value(), Some(4));
    assert_eq!(buffered.advance().await.value(), Some(5));
    assert!(buffered.advance().await.is_end());
}
