use std::collections::VecDeque;

use crate::iterator::Advance;
use crate::support::continuation::Continuation;

/// What a suspended sender's `send()` call resolves to once it is no
/// longer pending (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A consumer accepted the element.
    Delivered,
    /// The channel finished or failed before the element was delivered.
    Terminated,
}

#[derive(Debug, Clone, Copy)]
enum Terminal<F> {
    Finished,
    Failed(F),
}

struct Active<E, F> {
    next_id: u64,
    senders: VecDeque<(u64, Continuation<SendOutcome>, E)>,
    consumer: Option<Continuation<Advance<E, F>>>,
}

pub(crate) enum State<E, F> {
    Active(Active<E, F>),
    /// Transient: held only while a collection mutation is in flight.
    Modifying,
    Terminal(Option<Terminal<F>>),
}

/// What a `send()` call should do (spec §4.4 "Algorithm").
pub(crate) enum SendAction<E, F> {
    /// A consumer was already pending; resume it directly. `send()` itself
    /// returns without suspending.
    Delivered(Continuation<Advance<E, F>>, E),
    /// The channel was already terminal; `send()` returns without
    /// suspending and without delivery.
    Terminated,
    /// No consumer was waiting; `element` and the sender's continuation
    /// were queued under id `u64`, to be resumed later (delivery, or
    /// terminal drain).
    Suspended(u64),
}

/// What an `advance()` call should do.
pub(crate) enum ConsumeAction<E, F> {
    /// Return this value without suspending.
    Return(Advance<E, F>),
    /// Return `Advance::Value` and resume the sender whose element it was.
    ReturnAndResumeSender(Advance<E, F>, Continuation<SendOutcome>),
    /// No sender was queued; the caller suspended.
    Suspended,
}

/// Everything a terminal transition (`finish`/`fail`) needs to resume.
pub(crate) struct Drained<E, F> {
    pub(crate) senders: Vec<Continuation<SendOutcome>>,
    pub(crate) consumer: Option<(Continuation<Advance<E, F>>, Advance<E, F>)>,
}

impl<E, F> State<E, F> {
    pub(crate) fn new() -> Self {
        State::Active(Active {
            next_id: 0,
            senders: VecDeque::new(),
            consumer: None,
        })
    }

    /// `cont` is always created by the caller up front; it is installed
    /// only in the `Suspended` case, and dropped harmlessly otherwise —
    /// the decision to suspend and the installation happen in the same
    /// critical section so a concurrent `advance()` can never observe a
    /// "decided to suspend but not yet installed" gap (the same lost-wakeup
    /// hazard fixed in the buffer driver).
    pub(crate) fn send(&mut self, element: E, cont: Continuation<SendOutcome>) -> SendAction<E, F> {
        match self {
            State::Active(a) => {
                if let Some(consumer) = a.consumer.take() {
                    SendAction::Delivered(consumer, element)
                } else {
                    let id = a.next_id;
                    a.next_id += 1;
                    a.senders.push_back((id, cont, element));
                    SendAction::Suspended(id)
                }
            }
            _ => SendAction::Terminated,
        }
    }

    pub(crate) fn advance(&mut self, cont: Continuation<Advance<E, F>>) -> ConsumeAction<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Active(mut a) => {
                if let Some((_, sender_cont, element)) = a.senders.pop_front() {
                    *self = State::Active(a);
                    ConsumeAction::ReturnAndResumeSender(Advance::Value(element), sender_cont)
                } else {
                    a.consumer = Some(cont);
                    *self = State::Active(a);
                    ConsumeAction::Suspended
                }
            }
            State::Terminal(mut terminal) => {
                let advance = match terminal.take() {
                    Some(Terminal::Finished) | None => Advance::End,
                    Some(Terminal::Failed(f)) => Advance::Failure(f),
                };
                *self = State::Terminal(None);
                ConsumeAction::Return(advance)
            }
            State::Modifying => unreachable!("reentrant advance on channel state machine"),
        }
    }

    /// Cancellation cleanup for a single suspended sender, identified by
    /// the id returned from `send`'s `Suspended` case. A no-op if the
    /// sender has already been resumed (delivered or drained) by the time
    /// this runs — cancellation and delivery can race, and delivery wins.
    pub(crate) fn remove_sender(&mut self, id: u64) {
        if let State::Active(a) = self {
            a.senders.retain(|(sid, _, _)| *sid != id);
        }
    }

    /// Cancellation cleanup for the single suspended consumer. Only one
    /// consumer continuation can be pending at a time (spec §4.4
    /// invariant), so no id is needed.
    pub(crate) fn remove_consumer(&mut self) {
        if let State::Active(a) = self {
            a.consumer = None;
        }
    }

    pub(crate) fn finish(&mut self) -> Drained<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Active(a) => {
                let senders = a.senders.into_iter().map(|(_, cont, _)| cont).collect();
                let consumer = a.consumer.map(|cont| (cont, Advance::End));
                *self = State::Terminal(None);
                Drained { senders, consumer }
            }
            other @ State::Terminal(_) => {
                *self = other;
                Drained {
                    senders: Vec::new(),
                    consumer: None,
                }
            }
            State::Modifying => unreachable!("reentrant finish on channel state machine"),
        }
    }

    pub(crate) fn fail(&mut self, error: F) -> Drained<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Active(a) => {
                let senders = a.senders.into_iter().map(|(_, cont, _)| cont).collect();
                match a.consumer {
                    Some(cont) => {
                        *self = State::Terminal(None);
                        Drained {
                            senders,
                            consumer: Some((cont, Advance::Failure(error))),
                        }
                    }
                    None => {
                        *self = State::Terminal(Some(Terminal::Failed(error)));
                        Drained {
                            senders,
                            consumer: None,
                        }
                    }
                }
            }
            other @ State::Terminal(_) => {
                *self = other;
                Drained {
                    senders: Vec::new(),
                    consumer: None,
                }
            }
            State::Modifying => unreachable!("reentrant fail on channel state machine"),
        }
    }
}
