//! Per-thread free lists sitting in front of an [`ArenaInner`].
//!
//! Each OS thread that allocates from a given arena gets its own cache,
//! addressed by the arena's address rather than by any explicit handle —
//! exactly the way `thread_local!` storage already gives single-producer
//! single-consumer semantics for free: only the thread that owns a
//! `thread_local` cell ever touches it, so no lock is needed to guard it,
//! unlike the arena's own chunk slab which is shared across threads.

use std::cell::RefCell;
use std::collections::HashMap;

use netbuf_core::region::Region;

use crate::arena::ArenaInner;

pub(crate) struct CachedSlot {
    pub(crate) chunk_idx: usize,
    pub(crate) node_id: usize,
    pub(crate) region: Region,
}

#[derive(Default)]
struct PerArenaCache {
    small: HashMap<u8, Vec<CachedSlot>>,
    normal: HashMap<u8, Vec<CachedSlot>>,
    allocations_since_trim: u64,
}

impl PerArenaCache {
    fn bucket(&mut self, is_small: bool) -> &mut HashMap<u8, Vec<CachedSlot>> {
        if is_small {
            &mut self.small
        } else {
            &mut self.normal
        }
    }
}

thread_local! {
    static CACHES: RefCell<HashMap<usize, PerArenaCache>> = RefCell::new(HashMap::new());
}

fn arena_key(arena: &ArenaInner) -> usize {
    arena as *const ArenaInner as usize
}

/// Pops a cached slot for `depth` if this thread has one, else `None`.
pub(crate) fn try_acquire(arena: &ArenaInner, depth: u8, is_small: bool) -> Option<CachedSlot> {
    CACHES.with(|caches| {
        let mut caches = caches.borrow_mut();
        let per = caches.get_mut(&arena_key(arena))?;
        per.bucket(is_small).get_mut(&depth)?.pop()
    })
}

/// Returns a freed slot to this thread's cache for `depth`, evicting straight
/// back to the arena if the per-class cap is already full. Every `cap`-th
/// release also runs a trim pass so a thread that briefly spiked its working
/// set does not hold onto capacity forever.
pub(crate) fn release(
    arena: &ArenaInner,
    depth: u8,
    is_small: bool,
    slot: CachedSlot,
    cap: usize,
    trim_interval: u64,
) {
    CACHES.with(|caches| {
        let mut caches = caches.borrow_mut();
        let per = caches.entry(arena_key(arena)).or_default();
        let vec = per.bucket(is_small).entry(depth).or_default();
        if cap == 0 || vec.len() >= cap {
            arena.free_normal(slot.chunk_idx, slot.node_id);
        } else {
            vec.push(slot);
        }
        per.allocations_since_trim += 1;
        if trim_interval > 0 && per.allocations_since_trim >= trim_interval {
            per.allocations_since_trim = 0;
            trim_cache(arena, per);
        }
    });
}

fn trim_cache(arena: &ArenaInner, per: &mut PerArenaCache) {
    for bucket in [&mut per.small, &mut per.normal] {
        for slots in bucket.values_mut() {
            for slot in slots.drain(..) {
                arena.free_normal(slot.chunk_idx, slot.node_id);
            }
        }
    }
}

/// Drains every cached slot for `arena` on the calling thread, returning
/// capacity immediately rather than waiting for the next trim interval.
/// Called when a [`crate::allocator::PooledAllocator`] is closed.
pub(crate) fn drain(arena: &ArenaInner) {
    CACHES.with(|caches| {
        let mut caches = caches.borrow_mut();
        if let Some(mut per) = caches.remove(&arena_key(arena)) {
            trim_cache(arena, &mut per);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use netbuf_core::region::HeapMemoryManager;
    use std::sync::Arc;

    fn arena() -> ArenaInner {
        let config = PoolConfig::builder().with_page_size(4096).with_max_order(4).build().unwrap();
        ArenaInner::new(Arc::new(HeapMemoryManager), &config)
    }

    #[test]
    fn release_then_acquire_reuses_the_same_slot() {
        let arena = arena();
        let alloc = arena.allocate(4096).unwrap();
        let crate::arena::PooledAllocation::Normal { chunk_idx, node_id, region } = alloc else {
            panic!("expected normal allocation")
        };
        release(&arena, 4, true, CachedSlot { chunk_idx, node_id, region }, 8, 1000);
        let cached = try_acquire(&arena, 4, true);
        assert!(cached.is_some());
        assert!(try_acquire(&arena, 4, true).is_none());
    }

    #[test]
    fn cap_of_zero_returns_straight_to_arena() {
        let arena = arena();
        let alloc = arena.allocate(4096).unwrap();
        let crate::arena::PooledAllocation::Normal { chunk_idx, node_id, region } = alloc else {
            panic!("expected normal allocation")
        };
        release(&arena, 4, true, CachedSlot { chunk_idx, node_id, region }, 0, 1000);
        assert!(try_acquire(&arena, 4, true).is_none());
        assert_eq!(arena.metrics.active_chunks.load(std::sync::atomic::Ordering::Relaxed), 0);
    }
}
