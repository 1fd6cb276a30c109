//! C1 — the back-pressured buffer between a producer task and a single
//! consumer (spec §4.1).

mod driver;
mod policy;
mod state;

pub use policy::BufferPolicy;

use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::iterator::{Advance, AdvanceFuture, AsyncIterator, BoxedIterator};
use crate::support::continuation;
use crate::support::{CancellationHandle, CriticalSection};

use state::{ConsumerAction, State};

enum Inner<E, F> {
    /// Capacity-0 policies never spawn a driver; advances forward straight
    /// to the upstream iterator (spec §4.1 "Edge cases").
    Transparent(BoxedIterator<E, F>),
    Driven {
        state: Arc<CriticalSection<State<E, F>>>,
        cancel: CancellationHandle,
        upstream: AsyncMutex<Option<BoxedIterator<E, F>>>,
        driver: AsyncMutex<Option<JoinHandle<()>>>,
        policy: BufferPolicy,
    },
}

/// An [`AsyncIterator`] that applies a [`BufferPolicy`] between its
/// upstream and its consumer (spec §4.1).
pub struct BufferedIterator<E, F> {
    inner: Inner<E, F>,
}

impl<E, F> BufferedIterator<E, F>
where
    E: Send + 'static,
    F: Send + 'static,
{
    pub fn new<U>(upstream: U, policy: BufferPolicy) -> Self
    where
        U: AsyncIterator<Item = E, Failure = F> + 'static,
    {
        let boxed: BoxedIterator<E, F> = Box::new(upstream);
        if policy.is_transparent() {
            Self {
                inner: Inner::Transparent(boxed),
            }
        } else {
            Self {
                inner: Inner::Driven {
                    state: Arc::new(CriticalSection::new(State::new())),
                    cancel: CancellationHandle::new(),
                    upstream: AsyncMutex::new(Some(boxed)),
                    driver: AsyncMutex::new(None),
                    policy,
                },
            }
        }
    }
}

impl<E, F> AsyncIterator for BufferedIterator<E, F>
where
    E: Send + 'static,
    F: Send + 'static,
{
    type Item = E;
    type Failure = F;

    fn advance(&mut self) -> AdvanceFuture<'_, E, F> {
        Box::pin(async move {
            match &mut self.inner {
                Inner::Transparent(upstream) => upstream.advance().await,
                Inner::Driven {
                    state,
                    cancel,
                    upstream,
                    driver,
                    policy,
                } => {
                    loop {
                        let (tx, rx) = continuation::install::<Advance<E, F>>();
                        let action = state.transition(|s| s.consumer_advance(tx));
                        match action {
                            ConsumerAction::SpawnDriver => {
                                let mut upstream_guard = upstream.lock().await;
                                let upstream_iter = upstream_guard
                                    .take()
                                    .expect("driver spawned exactly once");
                                drop(upstream_guard);
                                let handle = tokio::spawn(driver::run::<E, F>(
                                    state.clone(),
                                    *policy,
                                    upstream_iter,
                                    cancel.token(),
                                ));
                                *driver.lock().await = Some(handle);
                                continue;
                            }
                            ConsumerAction::Return(advance) => return advance,
                            ConsumerAction::Suspended => {
                                return rx.await.unwrap_or(Advance::End);
                            }
                        }
                    }
                }
            }
        })
    }
}

impl<E, F> Drop for BufferedIterator<E, F> {
    fn drop(&mut self) {
        if let Inner::Driven { cancel, driver, .. } = &self.inner {
            cancel.cancel();
            if let Ok(mut guard) = driver.try_lock() {
                if let Some(handle) = guard.take() {
                    handle.abort();
                }
            }
        }
    }
}
