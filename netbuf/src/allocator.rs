//! The top-level entry point: pick a storage backend (heap vs. direct) and a
//! strategy (plain vs. pooled), then allocate through it.

use std::sync::Arc;

use netbuf_core::region::{wrap_external, DirectMemoryManager, HeapMemoryManager, MemoryManager};
use netbuf_core::{Buffer, Result};
use netbuf_pool::{PoolConfig, PooledAllocator};

enum Strategy {
    Plain { manager: Arc<dyn MemoryManager> },
    Pooled { manager: Arc<dyn MemoryManager>, pool: PooledAllocator },
}

/// Factory for [`Buffer`]s, constructed once per backend/strategy
/// combination and then reused for the lifetime of whatever owns it.
///
/// `heap`/`direct` allocate directly from the chosen [`MemoryManager`] with
/// no pooling; `pooled_heap`/`pooled_direct` front the same manager with a
/// [`PooledAllocator`] arena.
pub struct Allocator {
    strategy: Strategy,
}

impl Allocator {
    pub fn heap() -> Self {
        Self { strategy: Strategy::Plain { manager: Arc::new(HeapMemoryManager) } }
    }

    pub fn direct() -> Self {
        Self { strategy: Strategy::Plain { manager: Arc::new(DirectMemoryManager::default()) } }
    }

    pub fn pooled_heap(config: PoolConfig) -> Result<Self> {
        let manager: Arc<dyn MemoryManager> = Arc::new(HeapMemoryManager);
        let pool = PooledAllocator::new(Arc::clone(&manager), config)?;
        Ok(Self { strategy: Strategy::Pooled { manager, pool } })
    }

    pub fn pooled_direct(config: PoolConfig) -> Result<Self> {
        let direct = if config.direct_memory_cache_alignment == 0 {
            DirectMemoryManager::default()
        } else {
            DirectMemoryManager::with_alignment(config.direct_memory_cache_alignment)?
        };
        let manager: Arc<dyn MemoryManager> = Arc::new(direct);
        let pool = PooledAllocator::new(Arc::clone(&manager), config)?;
        Ok(Self { strategy: Strategy::Pooled { manager, pool } })
    }

    fn manager(&self) -> Arc<dyn MemoryManager> {
        match &self.strategy {
            Strategy::Plain { manager } | Strategy::Pooled { manager, .. } => Arc::clone(manager),
        }
    }

    pub fn allocate(&self, size: usize) -> Result<Buffer> {
        match &self.strategy {
            Strategy::Plain { manager } => Buffer::allocate(Arc::clone(manager), size),
            Strategy::Pooled { pool, .. } => pool.allocate(size),
        }
    }

    /// Returns a closure that hands out an independently owned, read-only
    /// [`Buffer`] over the same `bytes` every time it is called, without
    /// copying the backing storage more than once.
    pub fn constant_supplier(&self, bytes: Vec<u8>) -> impl Fn() -> Buffer + Send + Sync + 'static {
        let region = wrap_external(bytes);
        let template = Buffer::wrap(region, self.manager());
        template.make_read_only();
        move || {
            template
                .const_child()
                .expect("const_child over a fixed, already-allocated region cannot fail")
        }
    }

    /// Releases pooled capacity this thread is holding. Outstanding buffers
    /// remain valid; this only affects cached-but-unused slots. A no-op for
    /// non-pooled strategies.
    pub fn close(&self) {
        if let Strategy::Pooled { pool, .. } = &self.strategy {
            pool.close();
        }
    }
}
