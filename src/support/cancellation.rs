use tokio_util::sync::CancellationToken;

/// L2 — a one-shot cancel signal wired to every suspension point of a
/// driver task (spec §5 "Cancellation semantics").
///
/// `CancellationHandle` is owned by the iterator; dropping the iterator
/// drops the handle, which cancels the token and therefore every clone
/// held by the driver task and its sub-tasks.
#[derive(Debug)]
pub(crate) struct CancellationHandle {
    token: CancellationToken,
}

impl CancellationHandle {
    pub(crate) fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for CancellationHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
