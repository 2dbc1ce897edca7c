//! Thread-safe building blocks for concurrent services
//!
//! This crate provides a small set of primitives for moving data between
//! threads, reusing expensive heap resources, and issuing short-lived
//! identifiers under contention:
//!
//! - [`Channel`]: FIFO queue with optional capacity bound, blocking
//!   send/receive and a one-way close
//! - [`Pool`]: freelist cache of reusable instances with RAII checkout
//! - [`LeaseAllocator`]: fixed-capacity table issuing ids with a
//!   time-to-live, reclaiming expired leases lazily
//!
//! Two supporting utilities round out the toolkit: a line-oriented
//! [`config`] parser and a construct-once [`shared`] holder.
//!
//! The three core primitives are independent leaves; an embedding service
//! composes them. A typical shape is a worker pool draining a channel
//! while reusing pooled buffers and tagging requests with leased ids:
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! use threadkit::{Channel, LeaseAllocator, Pool};
//!
//! let jobs: Arc<Channel<String>> = Arc::new(Channel::bounded(16));
//! let buffers = Arc::new(Pool::new(|| Vec::<u8>::with_capacity(1024)));
//! let ids = Arc::new(LeaseAllocator::new(32, Duration::from_secs(30)));
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|_| {
//!         let (jobs, buffers, ids) = (jobs.clone(), buffers.clone(), ids.clone());
//!         thread::spawn(move || {
//!             while let Some(job) = jobs.recv() {
//!                 let id = ids.acquire();
//!                 let mut buf = buffers.acquire().unwrap();
//!                 buf.extend_from_slice(job.as_bytes());
//!                 // ... handle the job ...
//!                 ids.release(id);
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for i in 0..8 {
//!     jobs.send(format!("job-{i}"));
//! }
//! jobs.close();
//! for w in workers {
//!     w.join().unwrap();
//! }
//! ```
//!
//! None of the primitives expose timed or cancellable waits; callers that
//! need timeouts wrap the calls externally.

#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod error;
pub mod lease;
pub mod pool;
pub mod shared;

pub use channel::Channel;
pub use config::{Config, Section, Value};
pub use error::{Error, Result};
pub use lease::LeaseAllocator;
pub use pool::{Pool, PoolConfig, PoolStatsSnapshot, Poolable, Pooled};
pub use shared::Shared;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
