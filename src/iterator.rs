use std::future::Future;
use std::pin::Pin;

/// The result of a single [`AsyncIterator::advance`] call.
///
/// An iterator never produces a value after returning [`Advance::End`] or
/// [`Advance::Failure`] — every later advance must return [`Advance::End`].
#[derive(Debug)]
pub enum Advance<E, F> {
    /// The next element in the sequence.
    Value(E),
    /// The sequence has terminated normally.
    End,
    /// The sequence has terminated with a failure.
    Failure(F),
}

impl<E, F> Advance<E, F> {
    pub fn is_end(&self) -> bool {
        matches!(self, Advance::End)
    }

    pub fn value(self) -> Option<E> {
        match self {
            Advance::Value(e) => Some(e),
            _ => None,
        }
    }
}

/// A future returned by `advance`, boxed so upstream iterators can be used
/// behind a trait object (see spec §9 "Dynamic dispatch over iterators").
pub type AdvanceFuture<'a, E, F> = Pin<Box<dyn Future<Output = Advance<E, F>> + Send + 'a>>;

/// The pull-based async iterator contract (spec §3, §6).
///
/// `advance` must not be called concurrently on the same iterator — that is
/// a precondition, not something this trait enforces at runtime. Callers
/// must also not call `advance` again after it first returns `End` or
/// `Failure`, though implementations are required to keep returning `End`
/// if they do.
pub trait AsyncIterator: Send {
    /// The element type produced by this iterator.
    type Item: Send + 'static;
    /// The failure type produced by this iterator, if any.
    type Failure: Send + 'static;

    /// Produce the next value, `End`, or `Failure`. May suspend.
    fn advance(&mut self) -> AdvanceFuture<'_, Self::Item, Self::Failure>;
}

/// A boxed, type-erased upstream iterator — the capability set `{advance}`
/// referenced throughout spec §4.
pub type BoxedIterator<E, F> = Box<dyn AsyncIterator<Item = E, Failure = F> + Send>;

/// Build an iterator from an in-memory sequence — `make_iterator` in spec §6.
///
/// Idempotent on the immutable input slice of values, but the returned
/// iterator is single-use: once exhausted it only ever yields `End`.
pub fn make_iterator<E, F>(values: impl IntoIterator<Item = E>) -> VecIterator<E, F>
where
    E: Send + 'static,
    F: Send + 'static,
{
    VecIterator {
        values: values.into_iter().collect::<Vec<_>>().into_iter(),
        _failure: std::marker::PhantomData,
    }
}

/// An [`AsyncIterator`] over an in-memory `Vec`, used as the simplest
/// upstream in tests and as the return type of [`make_iterator`].
pub struct VecIterator<E, F> {
    values: std::vec::IntoIter<E>,
    _failure: std::marker::PhantomData<fn() -> F>,
}

impl<E, F> AsyncIterator for VecIterator<E, F>
where
    E: Send + 'static,
    F: Send + 'static,
{
    type Item = E;
    type Failure = F;

    fn advance(&mut self) -> AdvanceFuture<'_, E, F> {
        let next = self.values.next();
        Box::pin(async move {
            match next {
                Some(v) => Advance::Value(v),
                None => Advance::End,
            }
        })
    }
}
