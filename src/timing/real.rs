use std::time::{Duration, Instant};

use super::Phase;

/// Timer that tracks elapsed time when timing is enabled.
pub(crate) struct Timer(Instant);

impl Timer {
    #[inline]
    pub(crate) fn start() -> Self {
        Self(Instant::now())
    }

    #[inline]
    pub(crate) fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Accumulated time per phase for one reduction call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReduceTimings {
    pub sort: Duration,
    pub mark: Duration,
    pub scan: Duration,
    pub partition: Duration,
    pub decay: Duration,
    pub flatten: Duration,
}

impl ReduceTimings {
    #[inline]
    pub(crate) fn add(&mut self, phase: Phase, d: Duration) {
        match phase {
            Phase::Sort => self.sort += d,
            Phase::Mark => self.mark += d,
            Phase::Scan => self.scan += d,
            Phase::Partition => self.partition += d,
            Phase::Decay => self.decay += d,
            Phase::Flatten => self.flatten += d,
        }
    }

    pub fn total(&self) -> Duration {
        self.sort + self.mark + self.scan + self.partition + self.decay + self.flatten
    }

    /// Emit one `debug` event with per-phase milliseconds.
    pub fn report(&self, n: usize) {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        tracing::debug!(
            n,
            total_ms = ms(self.total()),
            sort_ms = ms(self.sort),
            mark_ms = ms(self.mark),
            scan_ms = ms(self.scan),
            partition_ms = ms(self.partition),
            decay_ms = ms(self.decay),
            flatten_ms = ms(self.flatten),
            "reduction timings"
        );
    }
}
