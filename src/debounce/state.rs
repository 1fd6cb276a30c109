use crate::iterator::Advance;
use crate::support::continuation::Continuation;

/// A value the driver has finished computing and is ready to hand to the
/// consumer — either immediately (if a consumer is suspended) or stashed
/// for the next `advance()` (spec §4.2 `buffered_element`, `UpstreamFailure`).
pub(crate) enum Ready<E, F> {
    None,
    /// A debounced element, with more upstream activity still possible.
    Value(E),
    /// The last debounced element; upstream has already ended, so once this
    /// value is delivered the iterator is finished.
    ValueThenEnd(E),
    End,
    Failure(F),
}

enum Residual<E, F> {
    Finished,
    Ready(Ready<E, F>),
}

fn split_ready<E, F>(ready: Ready<E, F>) -> (Advance<E, F>, Residual<E, F>) {
    match ready {
        Ready::Value(e) => (Advance::Value(e), Residual::Ready(Ready::None)),
        Ready::ValueThenEnd(e) => (Advance::Value(e), Residual::Ready(Ready::End)),
        Ready::End => (Advance::End, Residual::Finished),
        Ready::Failure(f) => (Advance::Failure(f), Residual::Finished),
        Ready::None => unreachable!("driver never marks an empty result ready"),
    }
}

pub(crate) enum ConsumerAction<E, F> {
    SpawnDriver,
    Return(Advance<E, F>),
    Suspended,
}

pub(crate) enum DriverReadyAction<E, F> {
    ResumeDownstream(Continuation<Advance<E, F>>, Advance<E, F>),
    Stored,
}

pub(crate) enum State<E, F> {
    Initial,
    Active {
        downstream: Option<Continuation<Advance<E, F>>>,
        ready: Ready<E, F>,
    },
    /// Transient: held only while a collection mutation is in flight.
    Modifying,
    Finished,
}

impl<E, F> State<E, F> {
    pub(crate) fn new() -> Self {
        State::Initial
    }

    pub(crate) fn consumer_advance(
        &mut self,
        cont: Continuation<Advance<E, F>>,
    ) -> ConsumerAction<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Initial => {
                *self = State::Active {
                    downstream: None,
                    ready: Ready::None,
                };
                ConsumerAction::SpawnDriver
            }
            State::Active {
                downstream: _,
                ready,
            } => match ready {
                Ready::None => {
                    *self = State::Active {
                        downstream: Some(cont),
                        ready: Ready::None,
                    };
                    ConsumerAction::Suspended
                }
                ready => {
                    let (deliver, residual) = split_ready(ready);
                    *self = match residual {
                        Residual::Finished => State::Finished,
                        Residual::Ready(r) => State::Active {
                            downstream: None,
                            ready: r,
                        },
                    };
                    ConsumerAction::Return(deliver)
                }
            },
            State::Finished => {
                *self = State::Finished;
                ConsumerAction::Return(Advance::End)
            }
            State::Modifying => unreachable!("reentrant advance on debounce state machine"),
        }
    }

    /// Driver calls this once it has a value/end/failure ready to deliver.
    pub(crate) fn driver_ready(&mut self, ready: Ready<E, F>) -> DriverReadyAction<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Active {
                downstream: Some(cont),
                ..
            } => {
                let (deliver, residual) = split_ready(ready);
                *self = match residual {
                    Residual::Finished => State::Finished,
                    Residual::Ready(r) => State::Active {
                        downstream: None,
                        ready: r,
                    },
                };
                DriverReadyAction::ResumeDownstream(cont, deliver)
            }
            State::Active { downstream: None, .. } => {
                *self = State::Active {
                    downstream: None,
                    ready,
                };
                DriverReadyAction::Stored
            }
            other => {
                *self = other;
                DriverReadyAction::Stored
            }
        }
    }

    /// Cancellation at any state (spec §5).
    pub(crate) fn cancel(&mut self) -> Option<Continuation<Advance<E, F>>> {
        match std::mem::replace(self, State::Modifying) {
            State::Active { downstream, .. } => {
                *self = State::Finished;
                downstream
            }
            _ => {
                *self = State::Finished;
                None
            }
        }
    }
}
