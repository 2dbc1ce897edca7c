//! Construct-once holder for sharing one instance across threads

use std::sync::Arc;

use once_cell::sync::OnceCell;

/// Holder that constructs its value at most once and hands out
/// reference-counted clones.
///
/// This is the dependency-injection replacement for a process-wide
/// singleton: the embedding service creates a `Shared` during startup,
/// passes it (or clones of the inner `Arc`) to whoever needs the
/// instance, and teardown happens exactly once when the last `Arc`
/// drops. There is no hidden global state; a `Shared` is an ordinary
/// value.
///
/// Construction is race-free: when several threads call
/// [`get_or_init`] concurrently, one factory runs and every caller
/// receives a clone of the same `Arc`.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use threadkit::{LeaseAllocator, Shared};
///
/// let holder: Shared<LeaseAllocator> = Shared::new();
/// let ids = holder.get_or_init(|| LeaseAllocator::new(64, Duration::from_secs(30)));
/// let again = holder.get_or_init(|| unreachable!("already constructed"));
/// assert_eq!(ids.acquire(), 0);
/// assert_eq!(again.capacity(), 64);
/// ```
///
/// [`get_or_init`]: Shared::get_or_init
pub struct Shared<T> {
    cell: OnceCell<Arc<T>>,
}

impl<T> Shared<T> {
    /// Create an empty holder
    pub const fn new() -> Self {
        Self { cell: OnceCell::new() }
    }

    /// Get the instance, constructing it if this is the first call
    pub fn get_or_init<F>(&self, init: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        self.cell.get_or_init(|| Arc::new(init())).clone()
    }

    /// Get the instance if it has been constructed
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    /// Whether the instance has been constructed
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn empty_until_first_init() {
        let holder: Shared<u32> = Shared::new();
        assert!(!holder.is_initialized());
        assert!(holder.get().is_none());

        holder.get_or_init(|| 7);
        assert!(holder.is_initialized());
        assert_eq!(*holder.get().unwrap(), 7);
    }

    #[test]
    fn factory_runs_exactly_once_across_threads() {
        let holder: &'static Shared<u32> = Box::leak(Box::new(Shared::new()));
        let runs: &'static AtomicUsize = Box::leak(Box::new(AtomicUsize::new(0)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                thread::spawn(move || {
                    *holder.get_or_init(|| {
                        runs.fetch_add(1, Ordering::SeqCst);
                        42
                    })
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 42);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn all_callers_share_one_allocation() {
        let holder: Shared<String> = Shared::new();
        let a = holder.get_or_init(|| "shared".to_string());
        let b = holder.get_or_init(|| "other".to_string());
        assert!(Arc::ptr_eq(&a, &b));
    }
}
