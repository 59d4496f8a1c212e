//! The pooled, arena-backed allocator itself: picks an arena per thread,
//! serves allocations from that arena's thread cache or chunk slab, and
//! wires a per-allocation recycler that routes frees back to wherever they
//! came from.

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use netbuf_core::lifecycle::{BufferRecycler, NullRecycler};
use netbuf_core::region::{MemoryManager, Region};
use netbuf_core::{Buffer, Result};

use crate::arena::{ArenaInner, PooledAllocation};
use crate::chunk::depth_for_pages;
use crate::config::PoolConfig;
use crate::thread_cache::{self, CachedSlot};

struct NormalRecycler {
    arena: Arc<ArenaInner>,
    chunk_idx: usize,
    node_id: usize,
    depth: u8,
    is_small: bool,
    cache_cap: usize,
    trim_interval: u64,
}

impl BufferRecycler for NormalRecycler {
    fn reclaim(&self, region: Region) {
        let slot = CachedSlot { chunk_idx: self.chunk_idx, node_id: self.node_id, region };
        thread_cache::release(&self.arena, self.depth, self.is_small, slot, self.cache_cap, self.trim_interval);
    }
}

struct PooledAllocatorInner {
    arenas: Vec<Arc<ArenaInner>>,
    manager: Arc<dyn MemoryManager>,
    config: PoolConfig,
    next_arena: AtomicUsize,
}

thread_local! {
    static ARENA_PIN: Cell<Option<(usize, usize)>> = const { Cell::new(None) };
}

impl PooledAllocatorInner {
    /// Every thread picks one arena, round-robin, the first time it
    /// allocates through a given pool, then sticks with it — mirroring
    /// Netty's "leastUsedArena at thread start, then pinned" affinity, with
    /// the pinning stored in `thread_local` state instead of a per-thread
    /// object the allocator would otherwise need to hand out.
    fn pinned_arena(self: &Arc<Self>) -> &Arc<ArenaInner> {
        let pool_key = Arc::as_ptr(self) as usize;
        let idx = ARENA_PIN.with(|pin| {
            if let Some((key, idx)) = pin.get() {
                if key == pool_key {
                    return idx;
                }
            }
            let idx = self.next_arena.fetch_add(1, Ordering::Relaxed) % self.arenas.len();
            pin.set(Some((pool_key, idx)));
            idx
        });
        &self.arenas[idx]
    }
}

/// A size-classed, arena-backed [`netbuf_core::lifecycle::BufferRecycler`]
/// source: `allocate` hands out buffers whose release routes back through a
/// thread cache and, failing that, an arena's chunk slab instead of the
/// global allocator.
#[derive(Clone)]
pub struct PooledAllocator {
    inner: Arc<PooledAllocatorInner>,
}

impl PooledAllocator {
    pub fn new(manager: Arc<dyn MemoryManager>, config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let arenas = (0..config.num_arenas)
            .map(|_| Arc::new(ArenaInner::new(Arc::clone(&manager), &config)))
            .collect();
        Ok(Self { inner: Arc::new(PooledAllocatorInner { arenas, manager, config, next_arena: AtomicUsize::new(0) }) })
    }

    pub fn allocate(&self, size: usize) -> Result<Buffer> {
        let arena = self.inner.pinned_arena();

        if size > arena.chunk_size() {
            let region = self.inner.manager.allocate_shared(size)?;
            return Ok(Buffer::wrap_with_recycler(region, Arc::clone(&self.inner.manager), Arc::new(NullRecycler)));
        }

        let pages_needed = size.div_ceil(self.inner.config.page_size);
        let depth = depth_for_pages(self.inner.config.max_order, pages_needed).unwrap_or(self.inner.config.max_order);
        let is_small = pages_needed <= 1;
        let cache_cap = if is_small { self.inner.config.small_cache_size } else { self.inner.config.normal_cache_size };

        if let Some(slot) = thread_cache::try_acquire(arena, depth, is_small) {
            let recycler = Arc::new(NormalRecycler {
                arena: Arc::clone(arena),
                chunk_idx: slot.chunk_idx,
                node_id: slot.node_id,
                depth,
                is_small,
                cache_cap,
                trim_interval: self.inner.config.cache_trim_interval,
            });
            return Ok(Buffer::wrap_with_recycler(slot.region, Arc::clone(&self.inner.manager), recycler));
        }

        match arena.allocate(size)? {
            PooledAllocation::Normal { chunk_idx, node_id, region } => {
                let recycler = Arc::new(NormalRecycler {
                    arena: Arc::clone(arena),
                    chunk_idx,
                    node_id,
                    depth,
                    is_small,
                    cache_cap,
                    trim_interval: self.inner.config.cache_trim_interval,
                });
                Ok(Buffer::wrap_with_recycler(region, Arc::clone(&self.inner.manager), recycler))
            }
            PooledAllocation::Huge(region) => {
                Ok(Buffer::wrap_with_recycler(region, Arc::clone(&self.inner.manager), Arc::new(NullRecycler)))
            }
        }
    }

    /// Drains this thread's cached capacity back to its arenas. Already
    /// outstanding buffers remain valid and release normally through their
    /// own recyclers regardless of whether `close` was ever called.
    pub fn close(&self) {
        for arena in &self.inner.arenas {
            thread_cache::drain(arena);
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netbuf_core::region::HeapMemoryManager;

    fn small_pool() -> PooledAllocator {
        let config = PoolConfig::builder()
            .with_num_arenas(1)
            .with_page_size(4096)
            .with_max_order(4)
            .build()
            .unwrap();
        PooledAllocator::new(Arc::new(HeapMemoryManager), config).unwrap()
    }

    #[test]
    fn allocate_and_drop_returns_capacity_for_reuse() {
        let pool = small_pool();
        let a = pool.allocate(128).unwrap();
        let ptr_a = a.identity();
        drop(a);
        let b = pool.allocate(128).unwrap();
        assert_ne!(b.identity(), ptr_a, "new Buffer wraps a fresh BufferCore even when storage is reused");
    }

    #[test]
    fn huge_allocation_bypasses_chunk_pooling() {
        let pool = small_pool();
        let chunk_bytes = pool.config().chunk_size();
        let huge = pool.allocate(chunk_bytes * 4).unwrap();
        assert_eq!(huge.capacity(), chunk_bytes * 4);
    }

    #[test]
    fn every_allocation_is_independently_owned() {
        let pool = small_pool();
        let a = pool.allocate(64).unwrap();
        let b = pool.allocate(64).unwrap();
        assert_ne!(a.identity(), b.identity());
    }
}
