use tokio::sync::oneshot;

/// A one-shot resumable reference to a suspended caller (spec §3
/// "Continuation"). Built on `tokio::sync::oneshot`: the channel's own
/// "send consumes the sender" rule gives us double-resume-is-impossible at
/// the type level, so the only remaining precondition is that a state
/// machine never holds two live continuations for the same role.
///
/// Both the "fallible" and "infallible" flavors from spec §9 are the same
/// underlying channel here — fallibility is expressed in `T` itself (e.g.
/// `Advance<E, F>` already carries failure), not in the channel plumbing.
pub(crate) type Continuation<T> = oneshot::Sender<T>;
pub(crate) type Waiting<T> = oneshot::Receiver<T>;

pub(crate) fn install<T>() -> (Continuation<T>, Waiting<T>) {
    oneshot::channel()
}

/// Resume a continuation with `value`. A failed send means the waiting
/// task was already cancelled and dropped its receiver — not a
/// precondition violation, just a wakeup with nowhere to go.
pub(crate) fn resume<T>(continuation: Continuation<T>, value: T) {
    let _ = continuation.send(value);
}
