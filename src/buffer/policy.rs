/// The buffering policy applied between a producer task and the consumer
/// (spec §4.1, §6 "Buffer policy surface").
///
/// Every variant with capacity `0` degenerates to a transparent pass-through
/// of the upstream iterator (spec §4.1 "Edge cases").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPolicy {
    /// Suspend the producer once the buffer holds `capacity` elements.
    Bounded(usize),
    /// Never suspend the producer.
    Unbounded,
    /// At capacity, drop the oldest buffered element to make room.
    BufferingLatest(usize),
    /// At capacity, drop the newly produced element.
    BufferingOldest(usize),
}

impl BufferPolicy {
    pub fn capacity(self) -> Option<usize> {
        match self {
            BufferPolicy::Bounded(n) => Some(n),
            BufferPolicy::Unbounded => None,
            BufferPolicy::BufferingLatest(n) => Some(n),
            BufferPolicy::BufferingOldest(n) => Some(n),
        }
    }

    /// `true` for policies with capacity `0` — a transparent pass-through.
    pub(crate) fn is_transparent(self) -> bool {
        self.capacity() == Some(0)
    }

    /// Whether this policy ever suspends the producer.
    pub(crate) fn suspends_producer(self) -> bool {
        matches!(self, BufferPolicy::Bounded(_))
    }
}
