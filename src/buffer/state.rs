use std::collections::VecDeque;

use crate::iterator::Advance;
use crate::support::continuation::Continuation;

use super::policy::BufferPolicy;

/// What the driver should do with a freshly produced upstream element,
/// decided under the mutex and executed after it is released.
pub(crate) enum AppendAction<E, F> {
    /// No consumer was waiting; the element was appended (or the buffer's
    /// drop-policy discarded something) — the driver just keeps reading.
    Continue,
    /// A consumer was suspended; resume it directly with this element,
    /// bypassing the buffer entirely.
    ResumeConsumer(Continuation<Advance<E, F>>, E),
}

/// What the driver should do before it next calls `upstream.advance()`.
pub(crate) enum DriverWait {
    /// Capacity is available (or the policy never suspends); proceed.
    Proceed,
    /// The buffer is full and no consumer is waiting; suspend until the
    /// consumer frees capacity.
    Suspend,
}

/// What a consumer's `advance()` call should do.
pub(crate) enum ConsumerAction<E, F> {
    /// Spawn the driver task; the caller should recurse into `Buffering`.
    SpawnDriver,
    /// Return this value to the caller immediately.
    Return(Advance<E, F>),
    /// No element is ready; the caller suspended and must await `Waiting`.
    Suspended,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Terminal<F> {
    End,
    Failure(F),
}

impl<F> Terminal<F> {
    fn into_advance<E>(self) -> Advance<E, F> {
        match self {
            Terminal::End => Advance::End,
            Terminal::Failure(f) => Advance::Failure(f),
        }
    }
}

/// What the driver should do once it has posted an end-of-stream/failure.
pub(crate) enum FinishAction<E, F> {
    /// A consumer was suspended; resume it with the terminal result.
    ResumeConsumer(Continuation<Advance<E, F>>, Advance<E, F>),
    /// Stashed in `Finished` for the next consumer advance.
    Stored,
}

pub(crate) enum State<E, F> {
    Initial,
    Buffering {
        buffer: VecDeque<E>,
        suspended_producer: Option<Continuation<()>>,
        suspended_consumer: Option<Continuation<Advance<E, F>>>,
    },
    /// Transient: held only while a collection mutation is in flight.
    Modifying,
    Finished {
        buffer: VecDeque<E>,
        terminal: Option<Terminal<F>>,
    },
}

impl<E, F> State<E, F> {
    pub(crate) fn new() -> Self {
        State::Initial
    }

    /// Consumer calls this on every `advance()`. `cont` is a freshly
    /// created continuation, installed only if the consumer must suspend.
    pub(crate) fn consumer_advance(
        &mut self,
        cont: Continuation<Advance<E, F>>,
    ) -> ConsumerAction<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Initial => {
                *self = State::Buffering {
                    buffer: VecDeque::new(),
                    suspended_producer: None,
                    suspended_consumer: None,
                };
                ConsumerAction::SpawnDriver
            }
            State::Buffering {
                mut buffer,
                suspended_producer,
                suspended_consumer: _,
            } => {
                if let Some(value) = buffer.pop_front() {
                    let freed = suspended_producer;
                    *self = State::Buffering {
                        buffer,
                        suspended_producer: None,
                        suspended_consumer: None,
                    };
                    if let Some(freed) = freed {
                        let _ = freed.send(());
                    }
                    ConsumerAction::Return(Advance::Value(value))
                } else {
                    *self = State::Buffering {
                        buffer,
                        suspended_producer,
                        suspended_consumer: Some(cont),
                    };
                    ConsumerAction::Suspended
                }
            }
            State::Finished {
                mut buffer,
                mut terminal,
            } => {
                if let Some(value) = buffer.pop_front() {
                    let action = ConsumerAction::Return(Advance::Value(value));
                    *self = State::Finished { buffer, terminal };
                    action
                } else {
                    let advance = terminal
                        .take()
                        .map(Terminal::into_advance)
                        .unwrap_or(Advance::End);
                    *self = State::Finished {
                        buffer,
                        terminal: None,
                    };
                    ConsumerAction::Return(advance)
                }
            }
            State::Modifying => unreachable!("reentrant advance on buffer state machine"),
        }
    }

    /// Driver calls this before reading from upstream. Deciding to suspend
    /// and installing the producer continuation happen in the same
    /// critical section so a consumer `advance()` racing this call can
    /// never free capacity in the gap between the two (a lost wakeup).
    pub(crate) fn driver_should_wait(
        &mut self,
        policy: BufferPolicy,
        cont: Continuation<()>,
    ) -> DriverWait {
        match self {
            State::Buffering {
                buffer,
                suspended_consumer,
                suspended_producer,
            } => {
                let capacity = policy.capacity();
                let full = matches!(capacity, Some(n) if buffer.len() >= n);
                if policy.suspends_producer() && full && suspended_consumer.is_none() {
                    *suspended_producer = Some(cont);
                    DriverWait::Suspend
                } else {
                    DriverWait::Proceed
                }
            }
            _ => DriverWait::Proceed,
        }
    }

    /// Driver calls this with a freshly produced upstream element.
    pub(crate) fn driver_append(&mut self, policy: BufferPolicy, value: E) -> AppendAction<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Buffering {
                mut buffer,
                suspended_producer,
                suspended_consumer,
            } => {
                if let Some(cont) = suspended_consumer {
                    *self = State::Buffering {
                        buffer,
                        suspended_producer,
                        suspended_consumer: None,
                    };
                    return AppendAction::ResumeConsumer(cont, value);
                }

                match policy {
                    BufferPolicy::BufferingLatest(n) if buffer.len() >= n && n > 0 => {
                        buffer.pop_front();
                        buffer.push_back(value);
                    }
                    BufferPolicy::BufferingOldest(n) if buffer.len() >= n && n > 0 => {
                        // Drop the newly produced element.
                    }
                    _ => buffer.push_back(value),
                }

                *self = State::Buffering {
                    buffer,
                    suspended_producer,
                    suspended_consumer: None,
                };
                AppendAction::Continue
            }
            other => {
                // Driver raced a cancellation/finish; nothing to do.
                *self = other;
                AppendAction::Continue
            }
        }
    }

    /// Driver calls this once, when upstream ends or fails. A suspended
    /// consumer can only exist while the buffer is empty (state invariant),
    /// so it is always safe to deliver the terminal result to it directly
    /// rather than also stashing it in `Finished`.
    pub(crate) fn driver_finish(&mut self, terminal: Terminal<F>) -> FinishAction<E, F> {
        match std::mem::replace(self, State::Modifying) {
            State::Buffering {
                buffer,
                suspended_producer,
                suspended_consumer,
            } => {
                if let Some(cont) = suspended_producer {
                    let _ = cont.send(());
                }
                match suspended_consumer {
                    Some(cont) => {
                        *self = State::Finished {
                            buffer,
                            terminal: None,
                        };
                        FinishAction::ResumeConsumer(cont, terminal.into_advance())
                    }
                    None => {
                        *self = State::Finished {
                            buffer,
                            terminal: Some(terminal),
                        };
                        FinishAction::Stored
                    }
                }
            }
            other => {
                *self = other;
                FinishAction::Stored
            }
        }
    }

    /// Cancellation at any state (spec §5).
    pub(crate) fn cancel(&mut self) -> (Option<Continuation<()>>, Option<Continuation<Advance<E, F>>>) {
        match std::mem::replace(self, State::Modifying) {
            State::Buffering {
                suspended_producer,
                suspended_consumer,
                ..
            } => {
                *self = State::Finished {
                    buffer: VecDeque::new(),
                    terminal: None,
                };
                (suspended_producer, suspended_consumer)
            }
            other @ (State::Initial | State::Finished { .. }) => {
                *self = match other {
                    State::Finished { buffer, .. } => State::Finished {
                        buffer,
                        terminal: None,
                    },
                    _ => State::Finished {
                        buffer: VecDeque::new(),
                        terminal: None,
                    },
                };
                (None, None)
            }
            State::Modifying => unreachable!("reentrant cancel on buffer state machine"),
        }
    }
}
