use async_sequence_core::channel::channel;
use async_sequence_core::{AsyncIterator, SendOutcome};

#[tokio::test]
async fn send_rendezvous_with_advance() {
    let (sender, mut receiver) = channel::<&'static str, ()>();

    let sender2 = sender.clone();
    let send_task = tokio::spawn(async move { sender2.send("x").await });

    let value = receiver.advance().await;
    assert_eq!(value.value(), Some("x"));
    assert_eq!(send_task.await.unwrap(), SendOutcome::Delivered);
}

#[tokio::test]
async fn finish_resumes_pending_senders_and_consumer() {
    // Scenario 5 (spec §8): a second sender queued behind the first is
    // resumed without delivery once `finish` fires, and the next consumer
    // advance sees end.
    let (sender, mut receiver) = channel::<&'static str, ()>();

    let s1 = sender.clone();
    let t1 = tokio::spawn(async move { s1.send("x").await });
    // Let T1 actually queue before the consumer accepts it.
    tokio::task::yield_now().await;

    assert_eq!(receiver.advance().await.value(), Some("x"));
    assert_eq!(t1.await.unwrap(), SendOutcome::Delivered);

    let s2 = sender.clone();
    let t2 = tokio::spawn(async move { s2.send("y").await });
    tokio::task::yield_now().await;

    sender.finish();

    assert_eq!(t2.await.unwrap(), SendOutcome::Terminated);
    assert!(receiver.advance().await.is_end());
}

#[tokio::test]
async fn fail_delivers_the_error_to_the_consumer() {
    let (sender, mut receiver) = channel::<&'static str, &'static str>();

    let consume = tokio::spawn(async move { receiver.advance().await });
    tokio::task::yield_now().await;

    sender.fail("disk on fire");

    match consume.await.unwrap() {
        async_sequence_core::Advance::Failure(f) => assert_eq!(f, "disk on fire"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn send_after_terminal_returns_without_delivery() {
    let (sender, _receiver) = channel::<&'static str, ()>();
    sender.finish();
    assert_eq!(sender.send("too-late").await, SendOutcome::Terminated);
}

#[tokio::test]
async fn cancelling_one_sender_does_not_affect_another() {
    let (sender, mut receiver) = channel::<&'static str, ()>();

    let s1 = sender.clone();
    let cancelled = tokio::spawn(async move { s1.send("dropped").await });
    tokio::task::yield_now().await;
    cancelled.abort();
    let _ = cancelled.await;

    let s2 = sender.clone();
    let t2 = tokio::spawn(async move { s2.send("kept").await });
    tokio::task::yield_now().await;

    assert_eq!(receiver.advance().await.value(), Some("kept"));
    assert_eq!(t2.await.unwrap(), SendOutcome::Delivered);
}
