//! One allocation domain: a slab of [`Chunk`]s binned by occupancy, the way
//! Netty's `PoolArena` threads chunks through `q_init -> q000 -> q025 ->
//! q050 -> q075 -> q100` lists so allocation search favors chunks that are
//! already moderately full (better packing, fewer chunks kept alive).
//!
//! Requests larger than one chunk ("huge") bypass binning entirely and go
//! straight to the backing [`MemoryManager`] — there is no buddy run large
//! enough to serve them, and pooling a huge allocation buys nothing since it
//! is unlikely to be reused at that exact size.

use std::sync::Arc;

#[cfg(not(loom))]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(loom)]
use loom::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;
use netbuf_core::region::{MemoryManager, Region};
use netbuf_core::{BufferError, Result};
use spin::Mutex;

use crate::chunk::Chunk;
use crate::config::PoolConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bin {
    QInit,
    Q000,
    Q025,
    Q050,
    Q075,
    Q100,
}

const BIN_COUNT: usize = 6;
const SEARCH_ORDER: [Bin; 5] = [Bin::Q050, Bin::Q025, Bin::Q000, Bin::QInit, Bin::Q075];

fn bin_index(bin: Bin) -> usize {
    match bin {
        Bin::QInit => 0,
        Bin::Q000 => 1,
        Bin::Q025 => 2,
        Bin::Q050 => 3,
        Bin::Q075 => 4,
        Bin::Q100 => 5,
    }
}

fn classify(usage: f32) -> Bin {
    if usage >= 1.0 {
        Bin::Q100
    } else if usage >= 0.75 {
        Bin::Q075
    } else if usage >= 0.50 {
        Bin::Q050
    } else if usage >= 0.25 {
        Bin::Q025
    } else if usage > 0.0 {
        Bin::Q000
    } else {
        Bin::QInit
    }
}

#[derive(Default)]
pub(crate) struct ArenaMetrics {
    pub(crate) normal_allocations: CachePadded<AtomicUsize>,
    pub(crate) huge_allocations: CachePadded<AtomicUsize>,
    pub(crate) active_chunks: CachePadded<AtomicUsize>,
}

struct ArenaState {
    chunks: Vec<Option<Chunk>>,
    bins: [Vec<usize>; BIN_COUNT],
}

impl ArenaState {
    fn new() -> Self {
        Self { chunks: Vec::new(), bins: Default::default() }
    }

    fn remove_from_bin(&mut self, bin: Bin, idx: usize) {
        let slot = &mut self.bins[bin_index(bin)];
        if let Some(pos) = slot.iter().position(|&i| i == idx) {
            slot.swap_remove(pos);
        }
    }

    fn push_to_bin(&mut self, bin: Bin, idx: usize) {
        self.bins[bin_index(bin)].push(idx);
    }
}

/// Per-arena slab of pooled chunks plus the manager used to grow it.
pub(crate) struct ArenaInner {
    state: Mutex<ArenaState>,
    manager: Arc<dyn MemoryManager>,
    page_size: usize,
    max_order: u8,
    chunk_size: usize,
    pub(crate) metrics: ArenaMetrics,
}

impl ArenaInner {
    pub(crate) fn new(manager: Arc<dyn MemoryManager>, config: &PoolConfig) -> Self {
        Self {
            state: Mutex::new(ArenaState::new()),
            manager,
            page_size: config.page_size,
            max_order: config.max_order,
            chunk_size: config.chunk_size(),
            metrics: ArenaMetrics::default(),
        }
    }

    pub(crate) fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Allocates `size` bytes. Sizes larger than one chunk are served
    /// unpooled, directly from the backing manager.
    pub(crate) fn allocate(&self, size: usize) -> Result<PooledAllocation> {
        if size > self.chunk_size {
            self.metrics.huge_allocations.fetch_add(1, Ordering::Relaxed);
            let region = self.manager.allocate_shared(size)?;
            return Ok(PooledAllocation::Huge(region));
        }
        self.metrics.normal_allocations.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock();

        for &bin in &SEARCH_ORDER {
            let candidates: Vec<usize> = state.bins[bin_index(bin)].clone();
            for idx in candidates {
                if let Some(chunk) = state.chunks[idx].as_mut() {
                    if let Ok((node_id, region)) = chunk.allocate(size) {
                        let new_bin = classify(chunk.usage());
                        if new_bin != bin {
                            state.remove_from_bin(bin, idx);
                            state.push_to_bin(new_bin, idx);
                        }
                        return Ok(PooledAllocation::Normal { chunk_idx: idx, node_id, region });
                    }
                }
            }
        }

        let region = self.manager.allocate_shared(self.chunk_size)?;
        let mut chunk = Chunk::new(region, self.page_size, self.max_order);
        let (node_id, sub_region) = chunk.allocate(size).map_err(|_| {
            BufferError::allocation_failure("fresh chunk could not satisfy its own seeding allocation")
        })?;
        let idx = state.chunks.len();
        let new_bin = classify(chunk.usage());
        state.chunks.push(Some(chunk));
        state.push_to_bin(new_bin, idx);
        self.metrics.active_chunks.fetch_add(1, Ordering::Relaxed);
        Ok(PooledAllocation::Normal { chunk_idx: idx, node_id, region: sub_region })
    }

    pub(crate) fn free_normal(&self, chunk_idx: usize, node_id: usize) {
        let mut state = self.state.lock();
        let Some(chunk) = state.chunks[chunk_idx].as_mut() else { return };
        chunk.free(node_id);
        let old_bin = {
            let mut found = Bin::QInit;
            for bin in [Bin::QInit, Bin::Q000, Bin::Q025, Bin::Q050, Bin::Q075, Bin::Q100] {
                if state.bins[bin_index(bin)].contains(&chunk_idx) {
                    found = bin;
                    break;
                }
            }
            found
        };
        if chunk.is_empty() {
            state.remove_from_bin(old_bin, chunk_idx);
            state.chunks[chunk_idx] = None;
            self.metrics.active_chunks.fetch_sub(1, Ordering::Relaxed);
        } else {
            let new_bin = classify(chunk.usage());
            if new_bin != old_bin {
                state.remove_from_bin(old_bin, chunk_idx);
                state.push_to_bin(new_bin, chunk_idx);
            }
        }
    }
}

pub(crate) enum PooledAllocation {
    Normal { chunk_idx: usize, node_id: usize, region: Region },
    Huge(Region),
}
