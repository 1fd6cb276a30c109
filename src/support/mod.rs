//! Shared L1–L2 primitives used by every component in this crate: a
//! critical-section helper (L1), a cancellation handle (L2), and the
//! one-shot continuation plumbing (spec §3, §9).

pub(crate) mod cancellation;
pub(crate) mod continuation;
pub(crate) mod critical_section;

pub(crate) use cancellation::CancellationHandle;
pub(crate) use critical_section::CriticalSection;
