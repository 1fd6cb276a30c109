use std::collections::HashSet;

use async_sequence_core::{make_iterator, Advance, AsyncIterator, MergedIterator};

#[tokio::test]
async fn interleaves_and_waits_for_both_ends() {
    // Scenario 3 (spec §8): element multiset is {a,b,c,d}; end only after
    // both upstreams have ended. Exact interleave order is scheduling
    // dependent, so this only checks the multiset and the end condition.
    let a = make_iterator::<_, ()>(["a", "c"]);
    let b = make_iterator::<_, ()>(["b", "d"]);
    let mut merged = MergedIterator::new2(a, b);

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
    assert_eq!(seen, HashSet::from(["a", "b", "c", "d"]));
    assert!(merged.advance().await.is_end());
}

#[tokio::test]
async fn fails_fast_and_never_emits_after_the_failure() {
    // Scenario 4 (spec §8): the first failing upstream terminates the
    // merge; the surviving upstream's later elements are never observed.
    // The slow upstream sleeps long enough that the immediate failure is
    // guaranteed to win the race, keeping the test deterministic.
    struct FailsImmediately;

    impl AsyncIterator for FailsImmediately {
        type Item = &'static str;
        type Failure = &'static str;

        fn advance(
            &mut self,
        ) -> async_sequence_core::AdvanceFuture<'_, &'static str, &'static str> {
            Box::pin(async { Advance::Failure("boom") })
        }
    }

    struct DelayedOnce(Option<&'static str>);

    impl AsyncIterator for DelayedOnce {
        type Item = &'static str;
        type Failure = &'static str;

        fn advance(
            &mut self,
        ) -> async_sequence_core::AdvanceFuture<'_, &'static str, &'static str> {
            let next = self.0.take();
            Box::pin(async move {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                match next {
                    Some(v) => Advance::Value(v),
                    None => Advance::End,
                }
            })
        }
    }

    let failing = FailsImmediately;
    let slow = DelayedOnce(Some("never-seen"));
    let mut merged = MergedIterator::new2(failing, slow);

    let mut failed = false;
    loop {
        match merged.advance().await {
            Advance::Value(_) => {}
            Advance::End => panic!("merge ended without surfacing the failure"),
            Advance::Failure(f) => {
                assert_eq!(f, "boom");
                failed = true;
                break;
            }
        }
    }
    assert!(failed);
    assert!(merged.advance().await.is_end());
}

#[tokio::test]
async fn merges_three_upstreams() {
    let a = make_iterator::<_, ()>([1]);
    let b = make_iterator::<_, ()>([2]);
    let c = make_iterator::<_, ()>([3]);
    let mut merged = MergedIterator::new3(a, b, c);

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
    assert_eq!(seen, HashSet::from([1, 2, 3]));
}
