use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::iterator::Advance;
use crate::support::continuation::Continuation;

pub(crate) const MAX_SOURCES: usize = 3;

#[derive(Debug, Clone, Copy)]
pub(crate) enum TerminalResult<F> {
    End,
    Failure(F),
}

pub(crate) enum ConsumerAction<E, F> {
    SpawnDriver,
    Return(Advance<E, F>),
    /// The consumer suspended with an empty buffer; the caller must grant
    /// fresh demand to every upstream (spec §4.3 "resume all upstream
    /// continuations"), which in this implementation means adding a permit
    /// to each upstream's demand semaphore (see `merge::driver`).
    Suspended,
}

pub(crate) enum AppendAction<E, F> {
    Continue,
    ResumeConsumer(Continuation<Advance<E, F>>, E),
}

pub(crate) enum FinishOneAction<E, F> {
    Pending,
    AllFinished(Option<Continuation<Advance<E, F>>>),
}

pub(crate) enum FailAction<E, F> {
    ResumeConsumer(Continuation<Advance<E, F>>, F),
    Stored,
}

struct Merging<E, F> {
    buffer: VecDeque<E>,
    finished: SmallVec<[bool; MAX_SOURCES]>,
    downstream: Option<Continuation<Advance<E, F>>>,
}

pub(crate) enum State<E, F> {
    Initial { sources: usize },
    Merging(Merging<E, F>),
    /// Transient: held only while a collection mutation is in flight.
    Modifying,
    Terminal {
        buffer: VecDeque<E>,
        result: Option<TerminalResult<F>>,
    },
}

impl<E, F> State<E, F> {
    pub(crate) fn new(sources: usize) -> Self {
        debug_assert!((2..=MAX_SOURCES).contains(&sources));
        State::Initial { sources }
    }

    pub(crate) fn consumer_advance(
        &mut self,
        cont: Continuation<Advance<E, F>>,
    ) -> ConsumerAction<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Initial { sources } => {
                *self = State::Merging(Merging {
                    buffer: VecDeque::new(),
                    finished: SmallVec::from_elem(false, sources),
                    downstream: None,
                });
                ConsumerAction::SpawnDriver
            }
            State::Merging(mut m) => {
                if let Some(value) = m.buffer.pop_front() {
                    *self = State::Merging(m);
                    ConsumerAction::Return(Advance::Value(value))
                } else {
                    m.downstream = Some(cont);
                    *self = State::Merging(m);
                    ConsumerAction::Suspended
                }
            }
            State::Terminal {
                mut buffer,
                mut result,
            } => {
                if let Some(value) = buffer.pop_front() {
                    let action = ConsumerAction::Return(Advance::Value(value));
                    *self = State::Terminal { buffer, result };
                    action
                } else {
                    let advance = match result.take() {
                        Some(TerminalResult::End) | None => Advance::End,
                        Some(TerminalResult::Failure(f)) => Advance::Failure(f),
                    };
                    *self = State::Terminal {
                        buffer,
                        result: None,
                    };
                    ConsumerAction::Return(advance)
                }
            }
            State::Modifying => unreachable!("reentrant advance on merge state machine"),
        }
    }

    pub(crate) fn append(&mut self, value: E) -> AppendAction<E, F> {
        match self {
            State::Merging(m) => {
                if let Some(cont) = m.downstream.take() {
                    AppendAction::ResumeConsumer(cont, value)
                } else {
                    m.buffer.push_back(value);
                    AppendAction::Continue
                }
            }
            _ => AppendAction::Continue,
        }
    }

    pub(crate) fn finish_one(&mut self, index: usize) -> FinishOneAction<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Merging(mut m) => {
                m.finished[index] = true;
                if m.finished.iter().all(|&done| done) {
                    let downstream = m.downstream.take();
                    *self = State::Terminal {
                        buffer: m.buffer,
                        result: Some(TerminalResult::End),
                    };
                    FinishOneAction::AllFinished(downstream)
                } else {
                    *self = State::Merging(m);
                    FinishOneAction::Pending
                }
            }
            other => {
                *self = other;
                FinishOneAction::Pending
            }
        }
    }

    pub(crate) fn fail(&mut self, error: F) -> FailAction<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Merging(mut m) => match m.downstream.take() {
                Some(cont) => {
                    *self = State::Terminal {
                        buffer: m.buffer,
                        result: None,
                    };
                    FailAction::ResumeConsumer(cont, error)
                }
                None => {
                    *self = State::Terminal {
                        buffer: m.buffer,
                        result: Some(TerminalResult::Failure(error)),
                    };
                    FailAction::Stored
                }
            },
            other => {
                *self = other;
                FailAction::Stored
            }
        }
    }

    /// Cancellation at any state (spec §5).
    pub(crate) fn cancel(&mut self) -> Option<Continuation<Advance<E, F>>> {
        match std::mem::replace(self, State::Modifying) {
            State::Merging(m) => {
                *self = State::Terminal {
                    buffer: VecDeque::new(),
                    result: None,
                };
                m.downstream
            }
            other => {
                *self = match other {
                    State::Terminal { buffer, .. } => State::Terminal {
                        buffer,
                        result: None,
                    },
                    _ => State::Terminal {
                        buffer: VecDeque::new(),
                        result: None,
                    },
                };
                None
            }
        }
    }
}
