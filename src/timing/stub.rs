use std::time::Duration;

use super::Phase;

/// Dummy timer when `timing` is disabled (zero-sized).
pub(crate) struct Timer;

impl Timer {
    #[inline(always)]
    pub(crate) fn start() -> Self {
        Self
    }

    #[inline(always)]
    pub(crate) fn elapsed(&self) -> Duration {
        Duration::ZERO
    }
}

/// Dummy timings when `timing` is disabled (zero-sized).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReduceTimings;

impl ReduceTimings {
    #[inline(always)]
    pub(crate) fn add(&mut self, _phase: Phase, _d: Duration) {}

    #[inline(always)]
    pub fn total(&self) -> Duration {
        Duration::ZERO
    }

    #[inline(always)]
    pub fn report(&self, _n: usize) {}
}
