use crossbeam_channel::{Receiver, Sender};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Objects that can be reset and handed to another call.
pub trait Recycle: Default {
    /// Reset to the empty state. Returns `false` when the object should be
    /// dropped instead of retained (e.g. a buffer that grew too large).
    fn recycle(&mut self) -> bool;
}

/// Vectors larger than this are dropped on return instead of being retained.
pub const MAX_RETAINED_CAPACITY: usize = 256;

impl<T> Recycle for Vec<T> {
    fn recycle(&mut self) -> bool {
        self.clear();
        self.capacity() <= MAX_RETAINED_CAPACITY
    }
}

/// Lock-free free list of reusable objects.
///
/// Idle objects sit in a bounded MPMC channel: `acquire` is a `try_recv`,
/// release is a `try_send`. Neither blocks, so the pool can be shared by any
/// number of concurrent calls. An empty pool creates a fresh object; a full
/// pool drops the returned one.
pub struct ObjectPool<T: Recycle> {
    inner: Arc<PoolInner<T>>,
}

struct PoolInner<T> {
    idle_tx: Sender<T>,
    idle_rx: Receiver<T>,
    capacity: usize,
    created: AtomicU64,
    reused: AtomicU64,
    returned: AtomicU64,
    discarded: AtomicU64,
}

impl<T: Recycle> ObjectPool<T> {
    /// Create a pool retaining at most `capacity` idle objects.
    pub fn new(capacity: usize) -> Self {
        let (idle_tx, idle_rx) = crossbeam_channel::bounded(capacity);
        Self {
            inner: Arc::new(PoolInner {
                idle_tx,
                idle_rx,
                capacity,
                created: AtomicU64::new(0),
                reused: AtomicU64::new(0),
                returned: AtomicU64::new(0),
                discarded: AtomicU64::new(0),
            }),
        }
    }

    /// Check out an object. It goes back to the pool when the guard drops.
    #[inline]
    pub fn acquire(&self) -> Pooled<T> {
        let value = match self.inner.idle_rx.try_recv() {
            Ok(value) => {
                self.inner.reused.fetch_add(1, Ordering::Relaxed);
                value
            }
            Err(_) => {
                self.inner.created.fetch_add(1, Ordering::Relaxed);
                T::default()
            }
        };
        Pooled {
            value,
            pool: Arc::clone(&self.inner),
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.inner.capacity,
            idle: self.inner.idle_rx.len(),
            created: self.inner.created.load(Ordering::Relaxed),
            reused: self.inner.reused.load(Ordering::Relaxed),
            returned: self.inner.returned.load(Ordering::Relaxed),
            discarded: self.inner.discarded.load(Ordering::Relaxed),
        }
    }
}

impl<T: Recycle> Clone for ObjectPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Counters for a single pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub capacity: usize,
    pub idle: usize,
    /// Objects allocated because the pool was empty.
    pub created: u64,
    /// Objects handed out from the idle list.
    pub reused: u64,
    /// Objects put back on the idle list.
    pub returned: u64,
    /// Objects dropped on release (pool full or object oversized).
    pub discarded: u64,
}

impl PoolStats {
    pub fn acquired(&self) -> u64 {
        self.created + self.reused
    }

    pub fn released(&self) -> u64 {
        self.returned + self.discarded
    }

    /// Objects currently checked out.
    pub fn outstanding(&self) -> u64 {
        self.acquired().saturating_sub(self.released())
    }
}

/// Scope guard for a pooled object. Dropping it resets the object and returns
/// it to its pool, so release happens exactly once on every exit path.
pub struct Pooled<T: Recycle> {
    value: T,
    pool: Arc<PoolInner<T>>,
}

impl<T: Recycle> Deref for Pooled<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Recycle> DerefMut for Pooled<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Recycle + std::fmt::Debug> std::fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: Recycle> Drop for Pooled<T> {
    fn drop(&mut self) {
        let mut value = std::mem::take(&mut self.value);
        if !value.recycle() {
            self.pool.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }
        match self.pool.idle_tx.try_send(value) {
            Ok(()) => {
                self.pool.returned.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.pool.discarded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
