//! Statistics tracking for the object pool

use std::sync::atomic::{AtomicU64, Ordering};

/// Internal counters, all updated with relaxed ordering. The numbers are
/// observational; nothing in the pool branches on them.
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    gets: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    creates: AtomicU64,
    returns: AtomicU64,
    destroys: AtomicU64,
}

impl PoolStats {
    pub(crate) fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_creation(&self) {
        self.creates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_return(&self) {
        self.returns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_destructions(&self, n: u64) {
        self.destroys.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            creates: self.creates.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            destroys: self.destroys.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a pool's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatsSnapshot {
    /// Total checkout attempts
    pub gets: u64,
    /// Checkouts served from the freelist
    pub hits: u64,
    /// Checkouts that fell through to the factory
    pub misses: u64,
    /// Instances constructed
    pub creates: u64,
    /// Instances returned to the freelist
    pub returns: u64,
    /// Instances destroyed by cleanup
    pub destroys: u64,
}

impl PoolStatsSnapshot {
    /// Fraction of checkouts served from the freelist, 0.0 when idle
    pub fn hit_rate(&self) -> f64 {
        if self.gets == 0 { 0.0 } else { self.hits as f64 / self.gets as f64 }
    }
}
