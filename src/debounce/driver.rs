use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::clock::{SharedClock, SleepCancelled};
use crate::iterator::{Advance, BoxedIterator};
use crate::support::continuation;
use crate::support::CriticalSection;

use super::config::DebounceConfig;
use super::state::{DriverReadyAction, Ready, State};

/// The driver task body for a debounce iterator (spec §4.2 "Algorithm").
///
/// A single task plays both the "upstream reader" and "clock waiter" roles
/// from spec §4.2, racing an upstream advance against the current pending
/// element's deadline with `tokio::select!` rather than two cooperating
/// sub-tasks — an implementation simplification recorded in DESIGN.md; the
/// externally observable timing and ordering contract is unchanged.
pub(crate) async fn run<E, F>(
    state: Arc<CriticalSection<State<E, F>>>,
    config: DebounceConfig,
    clock: SharedClock,
    mut upstream: BoxedIterator<E, F>,
    cancel: CancellationToken,
) where
    E: Send + Sync + 'static,
    F: Send + 'static,
{
    let mut pending: Option<(E, Instant)> = None;
    // Once upstream has ended, the only thing left to do is let any
    // pending element's deadline elapse (spec §8: no emitted element may
    // be emitted earlier than `arrival + interval`, even the final one) —
    // so upstream is no longer polled once this is set.
    let mut ended = false;

    loop {
        let deadline_sleep = async {
            match &pending {
                Some((_, deadline)) => clock.sleep_until(*deadline, config.tolerance, &cancel).await,
                None => std::future::pending::<Result<(), SleepCancelled>>().await,
            }
        };
        let upstream_advance = async {
            if ended {
                std::future::pending::<Advance<E, F>>().await
            } else {
                upstream.advance().await
            }
        };

        tokio::select! {
            advanced = upstream_advance => {
                match advanced {
                    Advance::Value(value) => {
                        let deadline = clock.now() + config.interval;
                        trace!("debounce: element arrived, deadline extended");
                        pending = Some((value, deadline));
                    }
                    Advance::End => {
                        trace!("debounce: upstream ended");
                        ended = true;
                        if pending.is_none() {
                            deliver(&state, Ready::End);
                            return;
                        }
                    }
                    Advance::Failure(failure) => {
                        trace!("debounce: upstream failed, dropping pending element");
                        pending = None;
                        deliver(&state, Ready::Failure(failure));
                        return;
                    }
                }
            }
            sleep_result = deadline_sleep => {
                match sleep_result {
                    Ok(()) => {
                        if let Some((value, deadline)) = pending.take() {
                            if clock.now() >= deadline {
                                trace!("debounce: quiescence interval elapsed, emitting");
                                let ready = if ended {
                                    Ready::ValueThenEnd(value)
                                } else {
                                    Ready::Value(value)
                                };
                                deliver(&state, ready);
                                if ended {
                                    return;
                                }
                            } else {
                                // Woke early; the deadline must have been
                                // extended by a fresh arrival mid-sleep.
                                pending = Some((value, deadline));
                            }
                        }
                    }
                    Err(SleepCancelled) => {
                        finish_cancelled(&state);
                        return;
                    }
                }
            }
            _ = cancel.cancelled() => {
                finish_cancelled(&state);
                return;
            }
        }
    }
}

fn deliver<E, F>(state: &CriticalSection<State<E, F>>, ready: Ready<E, F>) {
    let action = state.transition(|s| s.driver_ready(ready));
    if let DriverReadyAction::ResumeDownstream(cont, advance) = action {
        continuation::resume(cont, advance);
    }
}

fn finish_cancelled<E, F>(state: &CriticalSection<State<E, F>>) {
    trace!("debounce driver cancelled");
    if let Some(cont) = state.transition(|s| s.cancel()) {
        continuation::resume(cont, Advance::End);
    }
}
