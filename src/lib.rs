//! Concurrency primitives for pull-based async sequences: a back-pressured
//! buffer, debounce, a fan-in merge, and a rendezvous multi-producer
//! channel, all built on the same pattern — a pure state machine protected
//! by a mutex, paired with a thin driver that performs the actions the
//! state machine computes.
//!
//! Every operator here is an [`AsyncIterator`]: a single-consumer, pull
//! based sequence where `advance` is the only operation, and it may
//! suspend. There is no generic `map`/`filter`/`chain`/`zip` combinator
//! library in this crate — those are expected to live alongside it as
//! separate collaborators; this crate only covers the concurrency-heavy
//! primitives that need a driver task.

pub mod buffer;
pub mod channel;
pub mod clock;
pub mod debounce;
pub mod iterator;
pub mod merge;
pub mod timer;

pub(crate) mod support;

pub use buffer::{BufferPolicy, BufferedIterator};
pub use channel::{Receiver, SendOutcome, Sender};
pub use clock::{Clock, SharedClock, SleepCancelled, SystemClock};
pub use debounce::{DebounceConfig, DebouncedIterator};
pub use iterator::{make_iterator, Advance, AdvanceFuture, AsyncIterator, BoxedIterator, VecIterator};
pub use merge::MergedIterator;
pub use timer::RepeatingTimer;
