//! jemalloc-style pooled allocation on top of `netbuf-core`: size-classed
//! chunks carved by a binary buddy tree, grouped into occupancy-banded
//! arenas, fronted by a lock-free per-thread cache.
//!
//! Allocations above one chunk's worth of bytes are served unpooled,
//! straight from the configured [`netbuf_core::region::MemoryManager`] —
//! there is no buddy run large enough to host them and pooling would not pay
//! for itself at that size.

mod allocator;
mod arena;
mod chunk;
mod config;
mod thread_cache;

pub use allocator::PooledAllocator;
pub use config::{PoolConfig, PoolConfigBuilder};
