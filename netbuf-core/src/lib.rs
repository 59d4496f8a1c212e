//! Ownership-carrying byte buffers and the memory-manager SPI they sit on.
//!
//! This crate is the innermost layer of the `netbuf` family: a single,
//! non-composite [`Buffer`] plus the [`Region`]/[`MemoryManager`] contracts
//! that composite buffers and the pooled allocator build on top of. It has
//! no knowledge of arenas, chunks, or multi-buffer composition — those live
//! in `netbuf-composite` and `netbuf-pool`.

pub mod buffer;
pub mod cursor;
pub mod error;
pub mod lifecycle;
pub mod order;
pub mod ownership;
pub mod region;
pub mod send;

pub use buffer::Buffer;
pub use cursor::{ByteCursor, ReverseByteCursor};
pub use error::{BufferError, Result};
pub use lifecycle::{BufferRecycler, NullRecycler};
pub use order::ByteOrder;
pub use ownership::OwnershipState;
pub use region::{wrap_external, DirectMemoryManager, HeapMemoryManager, MemoryManager, Region};
pub use send::SendToken;
