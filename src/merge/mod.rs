//! C3 — fan-in of 2–3 upstreams with demand fairness (spec §4.3).

mod driver;
mod state;

use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use tokio::task::JoinHandle;

use crate::iterator::{Advance, AdvanceFuture, AsyncIterator, BoxedIterator};
use crate::support::continuation;
use crate::support::{CancellationHandle, CriticalSection};

use state::{ConsumerAction, State, MAX_SOURCES};

/// An [`AsyncIterator`] that interleaves elements from 2 or 3 upstreams as
/// they arrive, ending only once every upstream has ended, and failing
/// fast (cancelling the rest) the moment any upstream fails (spec §4.3).
pub struct MergedIterator<E, F> {
    state: Arc<CriticalSection<State<E, F>>>,
    cancel: CancellationHandle,
    demand: Vec<Arc<Semaphore>>,
    upstreams: AsyncMutex<Option<Vec<BoxedIterator<E, F>>>>,
    drivers: AsyncMutex<Option<Vec<JoinHandle<()>>>>,
}

impl<E, F> MergedIterator<E, F>
where
    E: Send + 'static,
    F: Send + 'static,
{
    fn new(upstreams: Vec<BoxedIterator<E, F>>) -> Self {
        let sources = upstreams.len();
        assert!(
            (2..=MAX_SOURCES).contains(&sources),
            "merge accepts 2 to {MAX_SOURCES} upstreams, got {sources}"
        );
        Self {
            state: Arc::new(CriticalSection::new(State::new(sources))),
            cancel: CancellationHandle::new(),
            demand: (0..sources).map(|_| Arc::new(Semaphore::new(0))).collect(),
            upstreams: AsyncMutex::new(Some(upstreams)),
            drivers: AsyncMutex::new(None),
        }
    }

    /// Merge exactly two upstreams.
    pub fn new2<A, B>(a: A, b: B) -> Self
    where
        A: AsyncIterator<Item = E, Failure = F> + 'static,
        B: AsyncIterator<Item = E, Failure = F> + 'static,
    {
        Self::new(vec![Box::new(a), Box::new(b)])
    }

    /// Merge exactly three upstreams.
    pub fn new3<A, B, C>(a: A, b: B, c: C) -> Self
    where
        A: AsyncIterator<Item = E, Failure = F> + 'static,
        B: AsyncIterator<Item = E, Failure = F> + 'static,
        C: AsyncIterator<Item = E, Failure = F> + 'static,
    {
        Self::new(vec![Box::new(a), Box::new(b), Box::new(c)])
    }
}

impl<E, F> AsyncIterator for MergedIterator<E, F>
where
    E: Send + 'static,
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
                        let upstreams = self
                            .upstreams
                            .lock()
                            .await
                            .take()
                            .expect("driver spawned exactly once");
                        let handles = upstreams
                            .into_iter()
                            .enumerate()
                            .map(|(index, upstream)| {
                                tokio::spawn(driver::run_upstream(
                                    index,
                                    self.state.clone(),
                                    self.demand[index].clone(),
                                    upstream,
                                    self.cancel.token(),
                                ))
                            })
                            .collect();
                        *self.drivers.lock().await = Some(handles);
                        continue;
                    }
                    ConsumerAction::Return(advance) => return advance,
                    ConsumerAction::Suspended => {
                        driver::grant_demand(&self.demand);
                        return rx.await.unwrap_or(Advance::End);
                    }
                }
            }
        })
    }
}

impl<E, F> Drop for MergedIterator<E, F> {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Ok(mut guard) = self.drivers.try_lock() {
            if let Some(handles) = guard.take() {
                for handle in handles {
                    handle.abort();
                }
            }
        }
    }
}
