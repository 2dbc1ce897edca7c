//! Object pooling for reuse of expensive heap allocations

mod stats;

use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use stats::PoolStats;
pub use stats::PoolStatsSnapshot;

/// Trait for types that can live in a [`Pool`].
///
/// `reset` runs every time an instance returns to the freelist, before
/// it becomes visible to the next checkout. The default is a no-op; a
/// type that accumulates state should clear it here rather than in the
/// borrower.
pub trait Poolable: Send + 'static {
    /// Restore the instance to a reusable state
    fn reset(&mut self) {}
}

impl<T: Send + 'static> Poolable for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

impl Poolable for String {
    fn reset(&mut self) {
        self.clear();
    }
}

/// Configuration for an object pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Name used in errors and log events
    pub name: String,
    /// Instances constructed up front when `pre_warm` is set
    pub initial_capacity: usize,
    /// Cap on instances outstanding at once (`None` for unbounded)
    pub max_objects: Option<usize>,
    /// Construct `initial_capacity` instances at pool creation
    pub pre_warm: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { name: "pool".into(), initial_capacity: 0, max_objects: None, pre_warm: false }
    }
}

impl PoolConfig {
    /// Configuration for a pool that never holds more than `max` instances
    pub fn bounded(max: usize) -> Self {
        Self { max_objects: Some(max), ..Default::default() }
    }

    /// Set the pool name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Pre-construct `n` instances at pool creation
    pub fn pre_warmed(mut self, n: usize) -> Self {
        self.initial_capacity = n;
        self.pre_warm = true;
        self
    }
}

/// Thread-safe freelist cache of reusable instances.
///
/// `acquire` pops the most recently returned idle instance (LIFO) or
/// constructs a fresh one through the factory; it never blocks. The
/// returned [`Pooled`] guard hands the instance back on drop, so an
/// instance has exactly one owner at any time and double release is
/// unrepresentable.
///
/// The freelist sits behind its own mutex while the outstanding count
/// is a separate atomic, so count reads never serialize behind a slow
/// factory call.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use threadkit::Pool;
///
/// let pool = Arc::new(Pool::new(|| Vec::<u8>::with_capacity(4096)));
///
/// let handles: Vec<_> = (0..8)
///     .map(|_| {
///         let pool = pool.clone();
///         thread::spawn(move || {
///             let mut buf = pool.acquire().unwrap();
///             buf.extend_from_slice(b"payload");
///         })
///     })
///     .collect();
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert!(pool.idle_count() >= 1);
/// pool.cleanup();
/// assert_eq!(pool.outstanding_count(), 0);
/// ```
pub struct Pool<T: Poolable> {
    idle: Mutex<Vec<T>>,
    /// Instances constructed minus instances destroyed by cleanup.
    /// Outside the freelist lock on purpose (see type docs).
    outstanding: AtomicUsize,
    factory: Box<dyn Fn() -> T + Send + Sync>,
    config: PoolConfig,
    stats: PoolStats,
}

impl<T: Poolable> Pool<T> {
    /// Create an unbounded pool with a factory function
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_config(PoolConfig::default(), factory)
    }

    /// Create a pool with custom configuration
    pub fn with_config<F>(config: PoolConfig, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let stats = PoolStats::default();
        let mut idle = Vec::with_capacity(config.initial_capacity);

        if config.pre_warm {
            for _ in 0..config.initial_capacity {
                idle.push(factory());
                stats.record_creation();
            }
        }

        Self {
            outstanding: AtomicUsize::new(idle.len()),
            idle: Mutex::new(idle),
            factory: Box::new(factory),
            config,
            stats,
        }
    }

    /// Check an instance out of the pool.
    ///
    /// Pops the freelist if non-empty, otherwise constructs a new
    /// instance. Never blocks. Fails only with
    /// [`Error::PoolExhausted`] when `max_objects` instances are
    /// already outstanding and none is idle.
    pub fn acquire(&self) -> Result<Pooled<'_, T>> {
        self.stats.record_get();

        if let Some(value) = self.idle.lock().pop() {
            self.stats.record_hit();
            return Ok(Pooled { value: ManuallyDrop::new(value), pool: self });
        }
        self.stats.record_miss();

        // Reserve a count slot before constructing so concurrent misses
        // cannot overshoot the cap.
        if let Some(max) = self.config.max_objects {
            let reserved = self
                .outstanding
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1));
            if reserved.is_err() {
                debug!(pool = %self.config.name, max, "pool exhausted");
                return Err(Error::pool_exhausted(&self.config.name, max));
            }
        } else {
            self.outstanding.fetch_add(1, Ordering::AcqRel);
        }

        let value = (self.factory)();
        self.stats.record_creation();
        Ok(Pooled { value: ManuallyDrop::new(value), pool: self })
    }

    /// Check out an idle instance without ever constructing one
    pub fn try_acquire(&self) -> Option<Pooled<'_, T>> {
        self.stats.record_get();
        self.idle.lock().pop().map(|value| {
            self.stats.record_hit();
            Pooled { value: ManuallyDrop::new(value), pool: self }
        })
    }

    /// Re-attach a value previously taken out with [`Pooled::detach`].
    ///
    /// The value must originate from this pool; attaching a foreign
    /// value skews the outstanding count, which only tracks instances
    /// the pool itself constructed.
    pub fn put(&self, value: T) {
        self.put_back(value);
    }

    /// Instances constructed and not yet destroyed by [`cleanup`].
    ///
    /// Monotonic except for `cleanup`; instances checked out (or
    /// detached) still count. The value can be momentarily stale
    /// relative to the freelist, by design.
    ///
    /// [`cleanup`]: Pool::cleanup
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Instances currently idle on the freelist
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Destroy every idle instance and decrement the outstanding count.
    ///
    /// Instances currently checked out are unaffected; they rejoin the
    /// freelist when their guards drop.
    pub fn cleanup(&self) {
        let drained = mem::take(&mut *self.idle.lock());
        let n = drained.len();
        drop(drained);
        self.outstanding.fetch_sub(n, Ordering::AcqRel);
        self.stats.record_destructions(n as u64);
        debug!(pool = %self.config.name, destroyed = n, "pool cleanup");
    }

    /// Snapshot of the pool's counters
    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }

    fn put_back(&self, mut value: T) {
        value.reset();
        self.stats.record_return();
        self.idle.lock().push(value);
    }
}

impl<T: Poolable> Drop for Pool<T> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// RAII checkout guard for a pooled instance.
///
/// Dereferences to the instance; returns it to the pool's freelist on
/// drop after running [`Poolable::reset`]. Use [`detach`] to take the
/// value out of pool accounting entirely.
///
/// [`detach`]: Pooled::detach
pub struct Pooled<'a, T: Poolable> {
    value: ManuallyDrop<T>,
    pool: &'a Pool<T>,
}

impl<'a, T: Poolable> Pooled<'a, T> {
    /// Return the instance to the pool now.
    ///
    /// Equivalent to dropping the guard; provided for call sites where
    /// the hand-back deserves to be visible.
    pub fn release(self) {}

    /// Take ownership of the value, removing it from the pool's care.
    ///
    /// The pool's outstanding count keeps counting the instance until
    /// it is re-attached with [`Pool::put`]; a detached value that is
    /// simply dropped stays on the books forever. That asymmetry is
    /// the documented cost of taking values out of the pool.
    pub fn detach(mut self) -> T {
        let value = unsafe { ManuallyDrop::take(&mut self.value) };
        mem::forget(self);
        value
    }
}

impl<'a, T: Poolable> Deref for Pooled<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<'a, T: Poolable> DerefMut for Pooled<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<'a, T: Poolable> Drop for Pooled<'a, T> {
    fn drop(&mut self) {
        let value = unsafe { ManuallyDrop::take(&mut self.value) };
        self.pool.put_back(value);
    }
}
