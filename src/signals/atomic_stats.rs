/*!
 * Lock-Free Signal Statistics
 * Counters bumped from inside the async handler
 */

use std::sync::atomic::{AtomicU64, Ordering};

/// Highest signal number tracked (covers the real-time range on Linux)
pub const MAX_SIGNO: usize = 64;

/// Per-signal delivery counters
///
/// # Performance
/// - Only atomic stores, so safe to touch from a signal handler
/// - Relaxed ordering; readers only need eventual totals
#[repr(C, align(64))]
pub struct AtomicSignalStats {
    delivered: [AtomicU64; MAX_SIGNO + 1],
    dropped: AtomicU64,
}

impl AtomicSignalStats {
    pub const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const ZERO: AtomicU64 = AtomicU64::new(0);
        Self {
            delivered: [ZERO; MAX_SIGNO + 1],
            dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_delivery(&self, signo: i32) {
        if let Some(slot) = usize::try_from(signo).ok().and_then(|i| self.delivered.get(i)) {
            slot.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// A record that did not fit into the self-pipe
    #[inline]
    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered(&self, signo: i32) -> u64 {
        usize::try_from(signo)
            .ok()
            .and_then(|i| self.delivered.get(i))
            .map_or(0, |slot| slot.load(Ordering::Relaxed))
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for AtomicSignalStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_signal() {
        let stats = AtomicSignalStats::new();
        stats.record_delivery(15);
        stats.record_delivery(15);
        stats.record_delivery(2);

        assert_eq!(stats.delivered(15), 2);
        assert_eq!(stats.delivered(2), 1);
        assert_eq!(stats.delivered(6), 0);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let stats = AtomicSignalStats::new();
        stats.record_delivery(-1);
        stats.record_delivery(500);
        assert_eq!(stats.delivered(-1), 0);
        assert_eq!(stats.delivered(500), 0);

        stats.record_drop();
        assert_eq!(stats.dropped(), 1);
    }
}
