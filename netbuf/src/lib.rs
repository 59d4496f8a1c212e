//! A safe, ownership-carrying byte buffer library: a single [`Buffer`] type
//! with explicit acquire/close/send semantics, zero-copy composition via
//! [`CompositeBuffer`], and an optional jemalloc-style pooled allocator.
//!
//! This crate is the thin facade tying `netbuf-core`, `netbuf-composite`,
//! and `netbuf-pool` together behind one [`Allocator`] entry point; the
//! interesting mechanics live in those three crates.

mod allocator;
mod memory_managers;

pub use allocator::Allocator;
pub use memory_managers::{MemoryManagers, ScopedManager};

pub use netbuf_composite::CompositeBuffer;
pub use netbuf_core::region::{DirectMemoryManager, HeapMemoryManager, MemoryManager, Region};
pub use netbuf_core::{
    BufferError, ByteCursor, Result as BufferResult, ReverseByteCursor,
};
pub use netbuf_core::{Buffer, ByteOrder, OwnershipState, SendToken};
pub use netbuf_pool::{PoolConfig, PoolConfigBuilder, PooledAllocator};

/// Re-exports the names most call sites need; `use netbuf::prelude::*;`
/// pulls in `Buffer`, `CompositeBuffer`, `Allocator`, and the error types.
pub mod prelude {
    pub use crate::{
        Allocator, Buffer, BufferError, BufferResult, ByteOrder, CompositeBuffer, MemoryManager,
        MemoryManagers, OwnershipState, PoolConfig, PooledAllocator, SendToken,
    };
}
