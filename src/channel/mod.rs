//! C4 — a rendezvous, back-pressured multi-producer channel with a
//! terminal event (spec §4.4).

mod state;

use std::sync::Arc;

pub use state::SendOutcome;

use crate::iterator::{Advance, AdvanceFuture, AsyncIterator};
use crate::support::continuation;
use crate::support::CriticalSection;

use state::{ConsumeAction, SendAction, State};

/// Creates a channel, returning a [`Sender`] (cheaply [`Clone`]able — any
/// number of producer tasks may hold one) paired with its single
/// [`Receiver`].
pub fn channel<E, F>() -> (Sender<E, F>, Receiver<E, F>) {
    let state = Arc::new(CriticalSection::new(State::new()));
    (
        Sender {
            state: state.clone(),
        },
        Receiver { state },
    )
}

/// The producer half of a [`channel`]. `send` suspends until a consumer
/// accepts the element or the channel terminates (spec §4.4) — there is no
/// internal buffering, so a slow consumer directly back-pressures every
/// sender.
pub struct Sender<E, F> {
    state: Arc<CriticalSection<State<E, F>>>,
}

impl<E, F> Clone for Sender<E, F> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<E, F> Sender<E, F>
where
    E: Send + 'static,
    F: Send + 'static,
{
    /// Suspends until a consumer accepts `element`, or the channel
    /// terminates first. Cancelling the returned future (dropping it
    /// before it resolves) cleanly withdraws this send without affecting
    /// any other pending sender.
    pub async fn send(&self, element: E) -> SendOutcome {
        let (tx, rx) = continuation::install::<SendOutcome>();
        match self.state.transition(|s| s.send(element, tx)) {
            SendAction::Delivered(consumer, element) => {
                continuation::resume(consumer, Advance::Value(element));
                SendOutcome::Delivered
            }
            SendAction::Terminated => SendOutcome::Terminated,
            SendAction::Suspended(id) => {
                let _guard = SenderGuard {
                    state: &self.state,
                    id,
                };
                rx.await.unwrap_or(SendOutcome::Terminated)
            }
        }
    }

    /// Terminal: resumes every pending sender (with [`SendOutcome::Terminated`])
    /// and the pending consumer (with `Advance::End`), and marks the
    /// channel finished. Idempotent once the channel is already terminal.
    pub fn finish(&self) {
        let drained = self.state.transition(|s| s.finish());
        resume_drained(drained);
    }

    /// Terminal: like [`Self::finish`], but the consumer (if one is
    /// delivered to immediately, or the next one to call `advance`)
    /// receives `Advance::Failure(error)` instead of `Advance::End`.
    pub fn fail(&self, error: F) {
        let drained = self.state.transition(|s| s.fail(error));
        resume_drained(drained);
    }
}

fn resume_drained<E, F>(drained: state::Drained<E, F>) {
    for cont in drained.senders {
        continuation::resume(cont, SendOutcome::Terminated);
    }
    if let Some((cont, advance)) = drained.consumer {
        continuation::resume(cont, advance);
    }
}

/// Cleans up a queued sender if its `send()` future is dropped before
/// resolving. A no-op if delivery or a terminal drain already removed it —
/// cancellation and delivery race freely, and delivery wins.
struct SenderGuard<'a, E, F> {
    state: &'a CriticalSection<State<E, F>>,
    id: u64,
}

impl<E, F> Drop for SenderGuard<'_, E, F> {
    fn drop(&mut self) {
        self.state.transition(|s| s.remove_sender(self.id));
    }
}

/// The single consumer half of a [`channel`].
pub struct Receiver<E, F> {
    state: Arc<CriticalSection<State<E, F>>>,
}

impl<E, F> AsyncIterator for Receiver<E, F>
where
    E: Send + 'static,
    F: Send + 'static,
{
    type Item = E;
    type Failure = F;

    fn advance(&mut self) -> AdvanceFuture<'_, E, F> {
        Box::pin(async move {
            let (tx, rx) = continuation::install::<Advance<E, F>>();
            match self.state.transition(|s| s.advance(tx)) {
                ConsumeAction::Return(advance) => advance,
                ConsumeAction::ReturnAndResumeSender(advance, sender) => {
                    continuation::resume(sender, SendOutcome::Delivered);
                    advance
                }
                ConsumeAction::Suspended => {
                    let _guard = ConsumerGuard {
                        state: &self.state,
                    };
                    rx.await.unwrap_or(Advance::End)
                }
            }
        })
    }
}

struct ConsumerGuard<'a, E, F> {
    state: &'a CriticalSection<State<E, F>>,
}

impl<E, F> Drop for ConsumerGuard<'_, E, F> {
    fn drop(&mut self) {
        self.state.transition(|s| s.remove_consumer());
    }
}
