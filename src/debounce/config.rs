use std::time::Duration;

/// Quiescence interval and optional clock-sleep tolerance for a debounce
/// operator (spec §4.2, §6 "Debounce/Timer surface").
///
/// `tolerance = None` defers to the clock's own default coalescing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub interval: Duration,
    pub tolerance: Option<Duration>,
}

impl DebounceConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            tolerance: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}
