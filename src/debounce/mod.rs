//! C2 — emit the latest element only after a quiescence interval elapses
//! (spec §4.2).

mod config;
mod driver;
mod state;

pub use config::DebounceConfig;

use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::clock::SharedClock;
use crate::iterator::{Advance, AdvanceFuture, AsyncIterator, BoxedIterator};
use crate::support::continuation;
use crate::support::{CancellationHandle, CriticalSection};

use state::{ConsumerAction, State};

/// An [`AsyncIterator`] that coalesces bursts of upstream elements,
/// emitting only the most recent one once upstream goes quiet for
/// `config.interval` (spec §4.2).
pub struct DebouncedIterator<E, F> {
    state: Arc<CriticalSection<State<E, F>>>,
    cancel: CancellationHandle,
    upstream: AsyncMutex<Option<BoxedIterator<E, F>>>,
    driver: AsyncMutex<Option<JoinHandle<()>>>,
    config: DebounceConfig,
    clock: SharedClock,
}

impl<E, F> DebouncedIterator<E, F>
where
    E: Send + Sync + 'static,
    F: Send + 'static,
{
    pub fn new<U>(upstream: U, config: DebounceConfig, clock: SharedClock) -> Self
    where
        U: AsyncIterator<Item = E, Failure = F> + 'static,
    {
        Self {
            state: Arc::new(CriticalSection::new(State::new())),
            cancel: CancellationHandle::new(),
            upstream: AsyncMutex::new(Some(Box::new(upstream))),
            driver: AsyncMutex::new(None),
            config,
            clock,
        }
    }
}

impl<E, F> AsyncIterator for DebouncedIterator<E, F>
where
    E: Send + Sync + 'static,
    F: Send + 'static,
{
    type Item = E;
    type Failure = F;

    fn advance(&mut self) -> AdvanceFuture<'_, E, F> {
        Box::pin(async move {
            loop {
                let (tx, rx) = continuation::install::<Advance<E, F>>();
                let action = self.state.transition(|s| s.consumer_advance(tx));
                match action {
                    ConsumerAction::SpawnDriver => {
                        let upstream = self
                            .upstream
                            .lock()
                            .await
                            .take()
                            .expect("driver spawned exactly once");
                        let handle = tokio::spawn(driver::run(
                            self.state.clone(),
                            self.config,
                            self.clock.clone(),
                            upstream,
                            self.cancel.token(),
                        ));
                        *self.driver.lock().await = Some(handle);
                        continue;
                    }
                    ConsumerAction::Return(advance) => return advance,
                    ConsumerAction::Suspended => return rx.await.unwrap_or(Advance::End),
                }
            }
        })
    }
}

impl<E, F> Drop for DebouncedIterator<E, F> {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Ok(mut guard) = self.driver.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}
