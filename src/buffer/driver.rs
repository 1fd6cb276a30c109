use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::iterator::{Advance, BoxedIterator};
use crate::support::continuation;
use crate::support::CriticalSection;

use super::policy::BufferPolicy;
use super::state::{AppendAction, DriverWait, FinishAction, State, Terminal};

/// The driver task body for a buffered iterator (spec §4.1 "Driver loop").
/// One of these is spawned per non-transparent [`super::BufferedIterator`]
/// at first advance, and owns the upstream iterator for its whole lifetime.
pub(crate) async fn run<E, F>(
    state: Arc<CriticalSection<State<E, F>>>,
    policy: BufferPolicy,
    mut upstream: BoxedIterator<E, F>,
    cancel: CancellationToken,
) where
    E: Send + 'static,
    F: Send + 'static,
{
    loop {
        let (tx, rx) = continuation::install::<()>();
        let wait = state.transition(|s| s.driver_should_wait(policy, tx));
        if matches!(wait, DriverWait::Suspend) {
            trace!("buffer driver suspended: at capacity");
            tokio::select! {
                _ = rx => {}
                _ = cancel.cancelled() => {
                    finish_cancelled(&state);
                    return;
                }
            }
        }

        let advanced = tokio::select! {
            result = upstream.advance() => result,
            _ = cancel.cancelled() => {
                finish_cancelled(&state);
                return;
            }
        };

        match advanced {
            Advance::Value(value) => {
                let action = state.transition(|s| s.driver_append(policy, value));
                if let AppendAction::ResumeConsumer(cont, value) = action {
                    continuation::resume(cont, Advance::Value(value));
                }
            }
            Advance::End => {
                trace!("buffer upstream ended");
                deliver_terminal(&state, Terminal::End);
                return;
            }
            Advance::Failure(failure) => {
                trace!("buffer upstream failed");
                deliver_terminal(&state, Terminal::Failure(failure));
                return;
            }
        }
    }
}

fn deliver_terminal<E, F>(state: &CriticalSection<State<E, F>>, terminal: Terminal<F>) {
    let action = state.transition(|s| s.driver_finish(terminal));
    if let FinishAction::ResumeConsumer(cont, advance) = action {
        continuation::resume(cont, advance);
    }
}

fn finish_cancelled<E, F>(state: &CriticalSection<State<E, F>>) {
    trace!("buffer driver cancelled");
    let (producer, consumer) = state.transition(|s| s.cancel());
    if let Some(cont) = producer {
        continuation::resume(cont, ());
    }
    if let Some(cont) = consumer {
        continuation::resume(cont, Advance::End);
    }
}
