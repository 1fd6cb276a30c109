use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::iterator::{Advance, BoxedIterator};
use crate::support::continuation;
use crate::support::CriticalSection;

use super::state::{AppendAction, FailAction, FinishOneAction, State};

/// One of these runs per upstream (spec §4.3 "Algorithm"). It only reads
/// from `upstream` while holding a demand permit, so a fast upstream can
/// never produce more than one element ahead of what downstream has asked
/// for — the fairness property the spec calls for. Permits are granted by
/// [`grant_demand`] whenever the consumer finds the shared buffer empty.
pub(crate) async fn run_upstream<E, F>(
    index: usize,
    state: Arc<CriticalSection<State<E, F>>>,
    demand: Arc<Semaphore>,
    mut upstream: BoxedIterator<E, F>,
    cancel: CancellationToken,
) where
    E: Send + 'static,
    F: Send + 'static,
{
    loop {
        tokio::select! {
            permit = demand.acquire() => {
                match permit {
                    Ok(permit) => permit.forget(),
                    Err(_) => return,
                }
            }
            _ = cancel.cancelled() => {
                trace!(index, "merge: upstream cancelled waiting for demand");
                return;
            }
        }

        let advanced = tokio::select! {
            result = upstream.advance() => result,
            _ = cancel.cancelled() => {
                trace!(index, "merge: upstream cancelled");
                return;
            }
        };

        match advanced {
            Advance::Value(value) => {
                let action = state.transition(|s| s.append(value));
                if let AppendAction::ResumeConsumer(cont, value) = action {
                    continuation::resume(cont, Advance::Value(value));
                }
            }
            Advance::End => {
                trace!(index, "merge: upstream ended");
                let action = state.transition(|s| s.finish_one(index));
                if let FinishOneAction::AllFinished(Some(cont)) = action {
                    continuation::resume(cont, Advance::End);
                }
                return;
            }
            Advance::Failure(failure) => {
                trace!(index, "merge: upstream failed");
                cancel.cancel();
                let action = state.transition(|s| s.fail(failure));
                if let FailAction::ResumeConsumer(cont, failure) = action {
                    continuation::resume(cont, Advance::Failure(failure));
                }
                return;
            }
        }
    }
}

/// Grants one unit of demand to every upstream that has not yet finished.
/// Permits accumulate on the semaphore even if the corresponding subtask
/// has not reached its `acquire()` call yet, so this is race-proof against
/// subtask spawn order (unlike a one-shot continuation, which would be
/// lost if installed after this call runs).
pub(crate) fn grant_demand(semaphores: &[Arc<Semaphore>]) {
    for demand in semaphores {
        demand.add_permits(1);
    }
}
