//! Lease-based round-robin id allocation

use std::thread;
use std::time::{Duration, Instant};

use spin::Mutex;
use tracing::debug;

/// Fixed-capacity table issuing unique ids in `[0, N)` with a
/// time-to-live.
///
/// Slots are probed round-robin from a rotating cursor, so reuse
/// spreads across the table instead of bunching on low indices. A slot
/// is eligible when it is free or its lease has expired; expiry is
/// discovered lazily during the scan, no timer thread runs.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use threadkit::LeaseAllocator;
///
/// let ids = LeaseAllocator::new(4, Duration::from_secs(30));
/// let a = ids.acquire();
/// let b = ids.acquire();
/// assert_ne!(a, b);
/// ids.release(a);
/// ids.release(b);
/// ```
pub struct LeaseAllocator {
    table: Mutex<Table>,
    span: Duration,
}

struct Table {
    /// `None` = free, `Some(t)` = leased until `t`
    slots: Box<[Option<Instant>]>,
    cursor: usize,
}

impl LeaseAllocator {
    /// Create an allocator with `slots` ids and a fixed lease span.
    ///
    /// # Panics
    /// Panics if `slots` is zero.
    pub fn new(slots: usize, span: Duration) -> Self {
        assert!(slots > 0, "lease allocator needs at least one slot");
        Self {
            table: Mutex::new(Table { slots: vec![None; slots].into_boxed_slice(), cursor: 0 }),
            span,
        }
    }

    /// Acquire an id, waiting until one is eligible.
    ///
    /// Scans one full circuit from the cursor under the table lock; the
    /// first slot that is free or holds an expired lease is claimed
    /// (lease = now + span, cursor advanced past it). When the circuit
    /// finds nothing the thread yields the processor and rescans, so
    /// acquisition latency is unbounded while every lease stays live —
    /// a busy-wait trade-off this allocator makes for cheap uncontended
    /// acquisition. The lock is dropped around the yield so `release`
    /// can run in the meantime.
    pub fn acquire(&self) -> usize {
        loop {
            {
                let mut table = self.table.lock();
                let now = Instant::now();
                let n = table.slots.len();
                for _ in 0..n {
                    let id = table.cursor;
                    table.cursor = (id + 1) % n;
                    let slot = &mut table.slots[id];
                    if slot.is_none_or(|expires_at| expires_at <= now) {
                        *slot = Some(now + self.span);
                        return id;
                    }
                }
            }
            thread::yield_now();
        }
    }

    /// Release an id, making it immediately reissuable.
    ///
    /// Works whether or not the lease had already expired. Out-of-range
    /// ids are ignored.
    pub fn release(&self, id: usize) {
        let mut table = self.table.lock();
        match table.slots.get_mut(id) {
            Some(slot) => *slot = None,
            None => {
                drop(table);
                debug!(id, "ignoring release of out-of-range lease id");
            }
        }
    }

    /// Number of ids this allocator can issue
    pub fn capacity(&self) -> usize {
        self.table.lock().slots.len()
    }

    /// Number of currently live (unexpired, unreleased) leases
    pub fn in_use(&self) -> usize {
        let table = self.table.lock();
        let now = Instant::now();
        table.slots.iter().filter(|slot| slot.is_some_and(|expires_at| expires_at > now)).count()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    const LONG: Duration = Duration::from_secs(600);

    #[test]
    fn ids_issue_round_robin() {
        let ids = LeaseAllocator::new(4, LONG);
        assert_eq!(ids.acquire(), 0);
        assert_eq!(ids.acquire(), 1);
        assert_eq!(ids.acquire(), 2);
        assert_eq!(ids.acquire(), 3);
        assert_eq!(ids.in_use(), 4);
        assert_eq!(ids.capacity(), 4);
    }

    #[test]
    fn released_id_is_immediately_reissuable() {
        let ids = LeaseAllocator::new(2, LONG);
        assert_eq!(ids.acquire(), 0);
        assert_eq!(ids.acquire(), 1);
        ids.release(1);
        assert_eq!(ids.acquire(), 1);
    }

    #[test]
    fn cursor_rotates_past_released_low_slot() {
        let ids = LeaseAllocator::new(3, LONG);
        assert_eq!(ids.acquire(), 0);
        assert_eq!(ids.acquire(), 1);
        ids.release(0);
        // Cursor sits at 2, which is free; 0 comes up only afterwards
        assert_eq!(ids.acquire(), 2);
        assert_eq!(ids.acquire(), 0);
    }

    #[test]
    fn expired_lease_is_reclaimed_without_release() {
        let ids = LeaseAllocator::new(2, Duration::from_millis(50));
        assert_eq!(ids.acquire(), 0);
        assert_eq!(ids.acquire(), 1);
        assert_eq!(ids.in_use(), 2);

        thread::sleep(Duration::from_millis(80));
        assert_eq!(ids.in_use(), 0);
        assert_eq!(ids.acquire(), 0);
    }

    #[test]
    fn out_of_range_release_is_ignored() {
        let ids = LeaseAllocator::new(2, LONG);
        assert_eq!(ids.acquire(), 0);
        ids.release(17);
        assert_eq!(ids.in_use(), 1);
        assert_eq!(ids.acquire(), 1);
    }

    #[test]
    fn acquire_spins_until_release() {
        let ids = Arc::new(LeaseAllocator::new(1, LONG));
        assert_eq!(ids.acquire(), 0);

        let waiting = Arc::new(AtomicBool::new(true));
        let waiter = {
            let (ids, waiting) = (ids.clone(), waiting.clone());
            thread::spawn(move || {
                let id = ids.acquire();
                waiting.store(false, Ordering::SeqCst);
                id
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(waiting.load(Ordering::SeqCst));

        ids.release(0);
        assert_eq!(waiter.join().unwrap(), 0);
    }

    #[test]
    fn no_two_live_leases_share_an_id() {
        let ids = Arc::new(LeaseAllocator::new(8, LONG));
        let held: Arc<Vec<AtomicBool>> =
            Arc::new((0..8).map(|_| AtomicBool::new(false)).collect());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (ids, held) = (ids.clone(), held.clone());
                thread::spawn(move || {
                    for _ in 0..200 {
                        let id = ids.acquire();
                        assert!(!held[id].swap(true, Ordering::SeqCst), "id {id} issued twice");
                        held[id].store(false, Ordering::SeqCst);
                        ids.release(id);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(ids.in_use(), 0);
    }
}
