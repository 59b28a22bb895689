//! Request buffer pool
//!
//! Every `/write` request borrows one buffer of exactly `max_line_size`
//! bytes. Released buffers are kept in a lock-free queue for the next
//! request; when the queue is empty a new buffer is allocated, so acquiring
//! never blocks. `created()` counts real allocations only.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_queue::ArrayQueue;

/// Pool of fixed-size byte buffers
pub struct BufferPool {
    idle: ArrayQueue<Vec<u8>>,
    buffer_size: usize,
    created: AtomicU64,
}

impl BufferPool {
    /// Create an empty pool keeping at most `capacity` idle buffers
    pub fn new(capacity: usize, buffer_size: usize) -> Self {
        Self {
            idle: ArrayQueue::new(capacity.max(1)),
            buffer_size,
            created: AtomicU64::new(0),
        }
    }

    /// Borrow a buffer, returned to the pool when the guard drops
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        PooledBuffer {
            buf: self.get(),
            pool: Arc::clone(self),
        }
    }

    /// Take a buffer without a guard
    pub fn get(&self) -> Vec<u8> {
        match self.idle.pop() {
            Some(buf) => buf,
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                vec![0u8; self.buffer_size]
            }
        }
    }

    /// Return a buffer for reuse
    ///
    /// Buffers of the wrong size are a caller bug and are dropped.
    pub fn put(&self, buf: Vec<u8>) {
        debug_assert_eq!(buf.len(), self.buffer_size, "released buffer has the wrong size");
        if buf.len() != self.buffer_size {
            return;
        }
        // Full queue: let the buffer go.
        let _ = self.idle.push(buf);
    }

    /// Buffers ever allocated by this pool
    #[inline]
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Size of every buffer handed out
    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Buffers currently waiting for reuse
    #[inline]
    pub fn idle(&self) -> usize {
        self.idle.len()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffer_size", &self.buffer_size)
            .field("capacity", &self.idle.capacity())
            .field("idle", &self.idle.len())
            .field("created", &self.created())
            .finish()
    }
}

/// Buffer on loan from a `BufferPool`
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.buf));
    }
}
