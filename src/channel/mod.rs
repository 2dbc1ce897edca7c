//! Blocking FIFO channel for passing data between threads

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use tracing::trace;

/// FIFO channel with optional capacity bound and a one-way close.
///
/// Items are received in the order they were successfully enqueued,
/// across all producing threads: the single internal mutex is the sole
/// point of serialization, so send-commit order is total.
///
/// With capacity 0 the channel is unbounded and `send` never blocks.
/// With a positive capacity, `send` suspends while the queue is full.
/// `recv` suspends while the queue is empty and the channel is open.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use threadkit::Channel;
///
/// let ch: Arc<Channel<u32>> = Arc::new(Channel::bounded(2));
/// let producer = {
///     let ch = ch.clone();
///     thread::spawn(move || {
///         for i in 0..10 {
///             assert!(ch.send(i));
///         }
///         ch.close();
///     })
/// };
///
/// let mut seen = Vec::new();
/// while let Some(v) = ch.recv() {
///     seen.push(v);
/// }
/// producer.join().unwrap();
/// assert_eq!(seen, (0..10).collect::<Vec<_>>());
/// ```
///
/// # Caller discipline
/// `close` must not race with sends that expect success: a send that
/// observes the closed flag fails, but one already blocked on a full
/// queue when `close` lands still completes its enqueue. Threads that
/// both send and receive on the same channel are allowed as long as
/// they tolerate blocking.
pub struct Channel<T> {
    inner: Mutex<Inner<T>>,
    /// Signalled once per enqueue, broadcast on close
    readable: Condvar,
    /// Signalled once per dequeue (bounded channels only)
    writable: Condvar,
    capacity: usize,
}

struct Inner<T> {
    queue: VecDeque<T>,
    closed: bool,
}

impl<T> Channel<T> {
    /// Create an unbounded channel; `send` never blocks
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a bounded channel; `send` blocks while `capacity` items are queued
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(capacity)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { queue: VecDeque::new(), closed: false }),
            readable: Condvar::new(),
            writable: Condvar::new(),
            capacity,
        }
    }

    /// Send an item into the channel.
    ///
    /// Returns `false` immediately if the channel is closed. Otherwise,
    /// if bounded and currently full, blocks until a receiver frees
    /// space, then enqueues, wakes one waiting receiver and returns
    /// `true`. Closing the channel does not abort a sender that was
    /// already blocked here; it only fails sends that observe the
    /// closed flag before blocking.
    pub fn send(&self, item: T) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }

        while self.capacity > 0 && inner.queue.len() >= self.capacity {
            self.writable.wait(&mut inner);
        }

        inner.queue.push_back(item);
        drop(inner);
        self.readable.notify_one();
        true
    }

    /// Receive the oldest item from the channel.
    ///
    /// Blocks while the queue is empty and the channel is open. Returns
    /// `None` once the channel is closed and drained; items queued
    /// before `close` remain receivable.
    pub fn recv(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        while !inner.closed && inner.queue.is_empty() {
            self.readable.wait(&mut inner);
        }

        match inner.queue.pop_front() {
            Some(item) => {
                drop(inner);
                if self.capacity > 0 {
                    self.writable.notify_one();
                }
                Some(item)
            }
            // empty and closed
            None => None,
        }
    }

    /// Close the channel.
    ///
    /// Safe to call repeatedly. Wakes every thread blocked in [`recv`];
    /// already-queued items stay consumable. Senders blocked on a full
    /// queue are not woken here, they resume as receivers drain.
    ///
    /// [`recv`]: Channel::recv
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        let already = inner.closed;
        inner.closed = true;
        let queued = inner.queue.len();
        drop(inner);
        if !already {
            trace!(queued, "channel closed");
        }
        self.readable.notify_all();
    }

    /// Number of items currently queued
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Whether the queue is currently empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }

    /// Capacity bound, 0 meaning unbounded
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the channel has been closed
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}
