//! Transient image buffers and their release accounting.
//!
//! Every payload returned by the image service is tracked by a
//! [`BlobHandle`] from the moment it is received until the last consumer
//! stops referencing it. Handles are neither `Clone` nor `Copy`, so the
//! buffer is released exactly once: when the owning value is dropped.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Identifier of a tracked buffer, unique per registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobId(u64);

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob-{}", self.0)
    }
}

/// Counts live and released buffers for one render pipeline.
#[derive(Debug, Default)]
pub struct BlobRegistry {
    next_id: AtomicU64,
    live: AtomicUsize,
    live_bytes: AtomicUsize,
    released: AtomicU64,
}

impl BlobRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Starts tracking a buffer of `len` bytes.
    pub fn allocate(self: &Arc<Self>, len: usize) -> BlobHandle {
        let id = BlobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.live.fetch_add(1, Ordering::SeqCst);
        self.live_bytes.fetch_add(len, Ordering::SeqCst);
        trace!(blob = %id, bytes = len, "Blob allocated");

        BlobHandle {
            id,
            len,
            registry: Arc::clone(self),
        }
    }

    /// Number of buffers not yet released.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::SeqCst)
    }

    /// Total number of buffers released since creation.
    pub fn released_count(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }
}

/// Exclusive ownership of one tracked buffer.
pub struct BlobHandle {
    id: BlobId,
    len: usize,
    registry: Arc<BlobRegistry>,
}

impl BlobHandle {
    pub fn id(&self) -> BlobId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobHandle")
            .field("id", &self.id)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        self.registry.live.fetch_sub(1, Ordering::SeqCst);
        self.registry.live_bytes.fetch_sub(self.len, Ordering::SeqCst);
        self.registry.released.fetch_add(1, Ordering::SeqCst);
        trace!(blob = %self.id, "Blob released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_release() {
        let registry = BlobRegistry::new();

        let a = registry.allocate(100);
        let b = registry.allocate(20);
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.live_count(), 2);
        assert_eq!(registry.live_bytes(), 120);

        drop(a);
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.live_bytes(), 20);
        assert_eq!(registry.released_count(), 1);

        drop(b);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.released_count(), 2);
    }

    #[test]
    fn test_moving_handle_does_not_release() {
        let registry = BlobRegistry::new();
        let handle = registry.allocate(8);

        let moved = vec![handle];
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.released_count(), 0);

        drop(moved);
        assert_eq!(registry.released_count(), 1);
    }
}
