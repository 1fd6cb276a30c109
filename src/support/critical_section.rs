use std::sync::Mutex;

/// L1 — a mutex guarding a state-machine value, paired with a
/// `transition` helper that enforces the crate-wide discipline from spec
/// §5: every transition is a pure `(&mut State, Input) -> Action` function,
/// and the mutex is never held while an action (continuation resume, task
/// spawn, await) is performed.
///
/// Callers lock, mutate, compute the next action, and unlock — all inside
/// `transition` — then execute the returned action themselves, outside the
/// critical section.
pub(crate) struct CriticalSection<S> {
    state: Mutex<S>,
}

impl<S> CriticalSection<S> {
    pub(crate) fn new(state: S) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Run `f` with exclusive access to the state, returning whatever
    /// action `f` computes. `f` must not suspend or perform I/O — it only
    /// reads and mutates `state` and decides what the driver should do
    /// next.
    pub(crate) fn transition<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| {
            // A panic inside a transition is a precondition violation
            // elsewhere in the state machine; recover the guard so the
            // caller's `f` still observes the last consistent state.
            poisoned.into_inner()
        });
        f(&mut guard)
    }
}
