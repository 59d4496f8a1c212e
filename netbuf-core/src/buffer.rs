//! The owning, ownership-tracked byte buffer.
//!
//! A [`Buffer`] is a thin handle (`Arc<BufferCore>`) over a [`Region`]. Its
//! ownership state is never stored directly — it is read off the handle's
//! own `Arc` strong count plus one shared `accessible` flag, per
//! [`OwnershipState`]'s own doc comment. Two independent reference counts are
//! at play and it is easy to confuse them:
//!
//! - `Arc::strong_count(&self.core)` counts handles to the *same* buffer
//!   instance, produced only by [`Buffer::acquire`]. This is the
//!   OWNED/BORROWED axis.
//! - [`Region::shared_count`] counts handles over the *same backing storage*,
//!   produced by [`Buffer::slice`] and [`Buffer::split`], each of which hands
//!   out a brand new, independently owned `Buffer` with its own `BufferCore`.
//!   Release bookkeeping for pooled storage keys off this count, via
//!   [`crate::lifecycle::release`].

use std::cell::UnsafeCell;
use std::sync::Arc;

// Under `--cfg loom`, switch to loom's instrumented atomics so its model
// checker can explore every interleaving of `send`/`close`/accessor
// visibility; `Arc` stays the standard one, unaffected by ordering choices.
#[cfg(not(loom))]
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
#[cfg(loom)]
use loom::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::error::{BufferError, Result};
use crate::lifecycle::{self, BufferRecycler, LeakTracer, LifecycleEvent, NullRecycler};
use crate::order::ByteOrder;
use crate::ownership::OwnershipState;
use crate::region::{MemoryManager, Region};
use crate::send::SendToken;

struct Cursors {
    read_offset: usize,
    write_offset: usize,
}

struct BufferCore {
    region: Region,
    cursors: UnsafeCell<Cursors>,
    byte_order: AtomicU8,
    read_only: AtomicBool,
    /// Shared across every `Arc` clone of this core. Flipped exactly once,
    /// by `send`, and never reversed — a sent-away core stays inaccessible
    /// forever, including to the handle that sent it.
    accessible: AtomicBool,
    manager: Arc<dyn MemoryManager>,
    recycler: Arc<dyn BufferRecycler>,
    tracer: LeakTracer,
}

// SAFETY: `cursors` is mutated only under the single-writer discipline the
// buffer's ownership protocol enforces (see module docs); `Sync` here
// reflects that protocol, not ordinary data-race freedom.
unsafe impl Sync for BufferCore {}

impl Drop for BufferCore {
    fn drop(&mut self) {
        // Pass a borrow, not a clone: `self.region` is still alive for the
        // duration of this call (fields drop only after this fn returns), so
        // cloning it first would make `shared_count` see one handle too many
        // and `release` would never observe the true last-handle case.
        lifecycle::release(self.recycler.as_ref(), &self.region);
    }
}

fn byte_order_tag(order: ByteOrder) -> u8 {
    match order {
        ByteOrder::BigEndian => 0,
        ByteOrder::LittleEndian => 1,
    }
}

fn byte_order_from_tag(tag: u8) -> ByteOrder {
    match tag {
        0 => ByteOrder::BigEndian,
        _ => ByteOrder::LittleEndian,
    }
}

/// An ownership-carrying, bounds-checked window over a byte region.
///
/// Cloning a `Buffer` (via [`Buffer::acquire`]) shares the same underlying
/// cursors and storage — it is a second handle to the same instance, not an
/// independent copy. Use [`Buffer::slice`] or [`Buffer::split`] when an
/// independent view is wanted.
pub struct Buffer {
    core: Arc<BufferCore>,
}

/// Snapshot of everything needed to reconstruct a [`Buffer`] on the far side
/// of a [`SendToken`], without carrying the sender's own `BufferCore`
/// identity (and its now-permanently-inaccessible `accessible` flag) across.
pub(crate) struct SendPayload {
    region: Region,
    read_offset: usize,
    write_offset: usize,
    read_only: bool,
    byte_order: ByteOrder,
    manager: Arc<dyn MemoryManager>,
    recycler: Arc<dyn BufferRecycler>,
}

impl SendPayload {
    /// Borrowed, not cloned: callers that only need to check/release the
    /// region (see [`crate::lifecycle::release`]) must not inflate its
    /// shared count before doing so.
    pub(crate) fn region(&self) -> &Region {
        &self.region
    }

    pub(crate) fn recycler(&self) -> &dyn BufferRecycler {
        self.recycler.as_ref()
    }
}

impl Buffer {
    fn from_parts(
        region: Region,
        manager: Arc<dyn MemoryManager>,
        recycler: Arc<dyn BufferRecycler>,
        read_offset: usize,
        write_offset: usize,
        read_only: bool,
        byte_order: ByteOrder,
    ) -> Buffer {
        let core = BufferCore {
            region,
            cursors: UnsafeCell::new(Cursors { read_offset, write_offset }),
            byte_order: AtomicU8::new(byte_order_tag(byte_order)),
            read_only: AtomicBool::new(read_only),
            accessible: AtomicBool::new(true),
            manager,
            recycler,
            tracer: LeakTracer::new(),
        };
        Buffer { core: Arc::new(core) }
    }

    /// Allocates a fresh, empty, owned buffer: nothing readable yet, full
    /// capacity available for writing.
    pub fn allocate(manager: Arc<dyn MemoryManager>, size: usize) -> Result<Buffer> {
        Self::allocate_with_recycler(manager, Arc::new(NullRecycler), size)
    }

    /// Same as [`Buffer::allocate`], but routed through a custom recycler —
    /// the hook pooled allocators use to get capacity back instead of
    /// letting the region's storage free itself.
    pub fn allocate_with_recycler(
        manager: Arc<dyn MemoryManager>,
        recycler: Arc<dyn BufferRecycler>,
        size: usize,
    ) -> Result<Buffer> {
        let region = manager.allocate_shared(size)?;
        Ok(Self::from_parts(region, manager, recycler, 0, 0, false, ByteOrder::NATIVE))
    }

    /// Wraps an already-populated region as a fully readable, owned buffer
    /// (`read_offset = 0`, `write_offset = capacity`). Used by
    /// [`crate::region::wrap_external`] callers and by the pooled allocator
    /// when recovering a region from its free list.
    pub fn wrap(region: Region, manager: Arc<dyn MemoryManager>) -> Buffer {
        Self::wrap_with_recycler(region, manager, Arc::new(NullRecycler))
    }

    /// Same as [`Buffer::wrap`], routed through a custom recycler.
    pub fn wrap_with_recycler(
        region: Region,
        manager: Arc<dyn MemoryManager>,
        recycler: Arc<dyn BufferRecycler>,
    ) -> Buffer {
        let len = region.capacity();
        Self::from_parts(region, manager, recycler, 0, len, false, ByteOrder::NATIVE)
    }

    fn cursors(&self) -> &Cursors {
        // SAFETY: shared read under the single-writer protocol; never races
        // a concurrent mutation because mutation requires the same discipline.
        unsafe { &*self.core.cursors.get() }
    }

    #[allow(clippy::mut_from_ref)]
    fn cursors_mut(&self) -> &mut Cursors {
        // SAFETY: see `cursors`; callers only reach this after bounds/ownership
        // checks that make concurrent mutation a protocol violation, not a
        // possibility this type prevents structurally.
        unsafe { &mut *self.core.cursors.get() }
    }

    pub fn byte_order(&self) -> ByteOrder {
        byte_order_from_tag(self.core.byte_order.load(Ordering::Relaxed))
    }

    pub fn set_byte_order(&self, order: ByteOrder) {
        self.core.byte_order.store(byte_order_tag(order), Ordering::Relaxed);
    }

    pub fn capacity(&self) -> usize {
        self.core.region.capacity()
    }

    /// Stable identity for this buffer instance, for duplicate-detection in
    /// callers (e.g. composite construction rejecting the same buffer twice).
    /// Two handles produced by [`Buffer::acquire`] share an identity; a
    /// [`Buffer::slice`] or [`Buffer::split`] piece does not.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.core) as usize
    }

    pub fn read_offset(&self) -> usize {
        self.cursors().read_offset
    }

    pub fn write_offset(&self) -> usize {
        self.cursors().write_offset
    }

    pub fn readable_bytes(&self) -> usize {
        self.write_offset() - self.read_offset()
    }

    pub fn writable_bytes(&self) -> usize {
        self.capacity() - self.write_offset()
    }

    pub fn is_read_only(&self) -> bool {
        self.core.read_only.load(Ordering::Acquire)
    }

    /// The buffer's position in the ownership state machine, derived from
    /// its `Arc` strong count and accessibility flag (see module docs).
    pub fn ownership_state(&self) -> OwnershipState {
        if !self.core.accessible.load(Ordering::Acquire) {
            return OwnershipState::Inaccessible;
        }
        match Arc::strong_count(&self.core) {
            1 => OwnershipState::Owned,
            n => OwnershipState::Borrowed(n - 1),
        }
    }

    fn require_accessible(&self, op: &'static str) -> Result<()> {
        if !self.core.accessible.load(Ordering::Acquire) {
            return Err(BufferError::buffer_closed(op));
        }
        Ok(())
    }

    fn require_mutable(&self, op: &'static str) -> Result<()> {
        self.require_accessible(op)?;
        if self.core.read_only.load(Ordering::Acquire) {
            return Err(BufferError::read_only(op));
        }
        Ok(())
    }

    fn require_owned(&self, op: &'static str) -> Result<()> {
        self.require_accessible(op)?;
        if Arc::strong_count(&self.core) != 1 {
            return Err(BufferError::not_owned(op));
        }
        Ok(())
    }

    fn require_read_window(&self, op: &'static str, index: usize, len: usize) -> Result<()> {
        self.require_accessible(op)?;
        let write_offset = self.cursors().write_offset;
        if index.checked_add(len).is_none_or(|end| end > write_offset) {
            return Err(BufferError::index_out_of_range(index + len, write_offset, self.capacity()));
        }
        Ok(())
    }

    fn require_write_window(&self, op: &'static str, index: usize, len: usize) -> Result<()> {
        self.require_mutable(op)?;
        let cap = self.capacity();
        if index.checked_add(len).is_none_or(|end| end > cap) {
            return Err(BufferError::index_out_of_range(index + len, self.cursors().write_offset, cap));
        }
        Ok(())
    }

    /// Shares a new handle to this same buffer instance, bumping the
    /// OWNED/BORROWED reference count. The caller must eventually
    /// [`Buffer::close`] every handle produced this way.
    pub fn acquire(&self) -> Buffer {
        self.core.tracer.record(LifecycleEvent::Acquire);
        Buffer { core: Arc::clone(&self.core) }
    }

    /// Releases this handle. If it was the last one, the backing storage is
    /// reclaimed through the buffer's recycler (see [`lifecycle::release`]).
    pub fn close(self) {
        self.core.tracer.record(LifecycleEvent::Close);
    }

    pub fn set_read_offset(&self, offset: usize) -> Result<()> {
        self.require_accessible("set_read_offset")?;
        let write_offset = self.cursors().write_offset;
        if offset > write_offset {
            return Err(BufferError::index_out_of_range(offset, write_offset, self.capacity()));
        }
        self.cursors_mut().read_offset = offset;
        Ok(())
    }

    pub fn set_write_offset(&self, offset: usize) -> Result<()> {
        self.require_accessible("set_write_offset")?;
        let cap = self.capacity();
        if offset > cap {
            return Err(BufferError::index_out_of_range(offset, self.cursors().read_offset, cap));
        }
        if offset < self.cursors().read_offset {
            return Err(BufferError::index_out_of_range(offset, self.cursors().read_offset, cap));
        }
        self.cursors_mut().write_offset = offset;
        Ok(())
    }

    /// Makes the buffer permanently read-only. Monotonic: once set, there is
    /// no way back to writable through this or any acquired handle.
    pub fn make_read_only(&self) {
        self.core.read_only.store(true, Ordering::Release);
    }

    pub fn fill(&self, value: u8) -> Result<()> {
        self.require_mutable("fill")?;
        self.core.region.as_mut_slice().fill(value);
        Ok(())
    }

    fn read_slice(&self, index: usize, len: usize) -> Result<&[u8]> {
        self.require_read_window("read", index, len)?;
        Ok(&self.core.region.as_slice()[index..index + len])
    }

    fn write_slice(&self, index: usize, len: usize) -> Result<&mut [u8]> {
        self.require_write_window("write", index, len)?;
        Ok(&mut self.core.region.as_mut_slice()[index..index + len])
    }

    /// Copies `len` bytes starting at `src_offset` of this buffer into `dst`,
    /// starting at index 0. Does not touch either buffer's cursors.
    pub fn copy_into_slice(&self, src_offset: usize, dst: &mut [u8], len: usize) -> Result<()> {
        let src = self.read_slice(src_offset, len)?;
        dst[..len].copy_from_slice(src);
        Ok(())
    }

    /// Copies `len` bytes from this buffer into `dst`, tolerating overlap
    /// when `self` and `dst` share the same backing core (e.g. copying a
    /// buffer onto itself at a different offset) by iterating back-to-front.
    pub fn copy_into_buffer(&self, src_offset: usize, dst: &Buffer, dst_offset: usize, len: usize) -> Result<()> {
        self.require_accessible("copy_into")?;
        dst.require_mutable("copy_into destination")?;
        if len == 0 {
            return Ok(());
        }
        if Arc::ptr_eq(&self.core, &dst.core) && ranges_overlap(src_offset, dst_offset, len) {
            self.require_read_window("copy_into", src_offset, len)?;
            dst.require_write_window("copy_into", dst_offset, len)?;
            for i in (0..len).rev() {
                let byte = self.core.region.as_slice()[src_offset + i];
                dst.core.region.as_mut_slice()[dst_offset + i] = byte;
            }
            return Ok(());
        }
        let src = self.read_slice(src_offset, len)?;
        let out = dst.write_slice(dst_offset, len)?;
        out.copy_from_slice(src);
        Ok(())
    }

    /// An independently owned, read-only view over `[offset, offset+len)` of
    /// this buffer's storage. Bumps [`Region::shared_count`]; the view keeps
    /// the backing storage alive even after this buffer closes.
    pub fn slice(&self, offset: usize, len: usize) -> Result<Buffer> {
        self.require_read_window("slice", offset, len)?;
        let region = self.core.region.sub_region(offset, len)?;
        Ok(Self::from_parts(
            region,
            Arc::clone(&self.core.manager),
            Arc::clone(&self.core.recycler),
            0,
            len,
            true,
            self.byte_order(),
        ))
    }

    /// An independently owned, read-only duplicate of this buffer's entire
    /// readable window, sharing the same backing storage via
    /// [`MemoryManager::allocate_const_child`]. Intended for fanning one
    /// immutable payload out to many readers without copying it — each
    /// const-child bumps [`Region::shared_count`] exactly like [`Buffer::slice`].
    pub fn const_child(&self) -> Result<Buffer> {
        self.require_accessible("const_child")?;
        let region = self.core.manager.allocate_const_child(&self.core.region);
        let write_offset = self.write_offset();
        Ok(Self::from_parts(
            region,
            Arc::clone(&self.core.manager),
            Arc::clone(&self.core.recycler),
            0,
            write_offset,
            true,
            self.byte_order(),
        ))
    }

    /// Splits this buffer in two at `at`: the returned buffer owns
    /// `[0, at)`, and `self` is replaced in place with a fresh owned buffer
    /// over `[at, capacity)`. Both keep reading from the same backing
    /// storage; requires sole ownership.
    pub fn split(&mut self, at: usize) -> Result<Buffer> {
        self.require_owned("split")?;
        let cap = self.capacity();
        if at > cap {
            return Err(BufferError::index_out_of_range(at, self.cursors().write_offset, cap));
        }
        let (read_offset, write_offset, read_only, byte_order) = {
            let c = self.cursors();
            (c.read_offset, c.write_offset, self.is_read_only(), self.byte_order())
        };
        let left_region = self.core.region.sub_region(0, at)?;
        let right_region = self.core.region.sub_region(at, cap - at)?;

        let left = Self::from_parts(
            left_region,
            Arc::clone(&self.core.manager),
            Arc::clone(&self.core.recycler),
            read_offset.min(at),
            write_offset.min(at),
            read_only,
            byte_order,
        );
        let right = Self::from_parts(
            right_region,
            Arc::clone(&self.core.manager),
            Arc::clone(&self.core.recycler),
            read_offset.saturating_sub(at),
            write_offset.saturating_sub(at),
            read_only,
            byte_order,
        );
        self.core.tracer.record(LifecycleEvent::Close);
        *self = right;
        Ok(left)
    }

    /// Shifts readable bytes down to offset 0, discarding already-read bytes
    /// and freeing up writable room at the tail. Requires sole ownership,
    /// since it rewrites every byte in place.
    pub fn compact(&mut self) -> Result<()> {
        self.require_owned("compact")?;
        let (read_offset, write_offset) = {
            let c = self.cursors();
            (c.read_offset, c.write_offset)
        };
        let readable = write_offset - read_offset;
        if read_offset > 0 && readable > 0 {
            let slice = self.core.region.as_mut_slice();
            slice.copy_within(read_offset..write_offset, 0);
        }
        let c = self.cursors_mut();
        c.read_offset = 0;
        c.write_offset = readable;
        Ok(())
    }

    /// Ensures at least `size` more bytes are writable beyond the current
    /// write offset. First tries compacting in place (if `allow_compaction`
    /// and doing so frees enough room); if that is not enough, allocates a
    /// new region of at least `capacity + max(min_growth, size - writable)`
    /// bytes and copies the readable window across. Requires sole ownership.
    pub fn ensure_writable(&mut self, size: usize, min_growth: usize, allow_compaction: bool) -> Result<()> {
        self.require_owned("ensure_writable")?;
        if self.writable_bytes() >= size {
            return Ok(());
        }
        if allow_compaction {
            self.compact()?;
            if self.writable_bytes() >= size {
                return Ok(());
            }
        }
        let (read_offset, write_offset, read_only, byte_order) = {
            let c = self.cursors();
            (c.read_offset, c.write_offset, self.is_read_only(), self.byte_order())
        };
        let shortfall = size.saturating_sub(self.writable_bytes());
        let growth = shortfall.max(min_growth);
        let new_capacity = self.capacity().checked_add(growth).ok_or_else(|| {
            BufferError::allocation_failure("requested growth overflows capacity")
        })?;
        let new_region = self.core.manager.allocate_shared(new_capacity)?;
        new_region.as_mut_slice()[..write_offset - read_offset]
            .copy_from_slice(&self.core.region.as_slice()[read_offset..write_offset]);

        let grown = Self::from_parts(
            new_region,
            Arc::clone(&self.core.manager),
            Arc::clone(&self.core.recycler),
            0,
            write_offset - read_offset,
            read_only,
            byte_order,
        );
        self.core.tracer.record(LifecycleEvent::Close);
        *self = grown;
        Ok(())
    }

    /// Hands this owned buffer's contents off through a [`SendToken`],
    /// without consuming this handle: `self` stays inspectable but every
    /// accessor on it (and on any handle acquired from it) now fails with
    /// `BufferClosed`, since the underlying core is retired in place of the
    /// freshly minted one the token's receiver gets.
    pub fn send(&self) -> Result<SendToken> {
        self.require_owned("send")?;
        let c = self.cursors();
        let payload = SendPayload {
            region: self.core.region.clone(),
            read_offset: c.read_offset,
            write_offset: c.write_offset,
            read_only: self.is_read_only(),
            byte_order: self.byte_order(),
            manager: Arc::clone(&self.core.manager),
            recycler: Arc::clone(&self.core.recycler),
        };
        self.core.accessible.store(false, Ordering::Release);
        self.core.tracer.record(LifecycleEvent::Send);
        Ok(SendToken::new(payload))
    }

    /// Opens a forward, byte-at-a-time cursor over `[start, start+length)`,
    /// independent of this buffer's own read/write offsets.
    pub fn open_cursor(&self, start: usize, length: usize) -> Result<crate::cursor::ByteCursor<'_>> {
        crate::cursor::open_cursor(self, start, length)
    }

    /// Opens a reverse cursor over the same kind of window, walking from the
    /// high end down.
    pub fn open_reverse_cursor(&self, start: usize, length: usize) -> Result<crate::cursor::ReverseByteCursor<'_>> {
        crate::cursor::open_reverse_cursor(self, start, length)
    }

    pub(crate) fn from_send_payload(payload: SendPayload) -> Buffer {
        Self::from_parts(
            payload.region,
            payload.manager,
            payload.recycler,
            payload.read_offset,
            payload.write_offset,
            payload.read_only,
            payload.byte_order,
        )
    }
}

fn ranges_overlap(a_start: usize, b_start: usize, len: usize) -> bool {
    a_start < b_start + len && b_start < a_start + len
}

macro_rules! primitive_accessors {
    ($ty:ty, $size:literal, $get:ident, $set:ident, $read:ident, $write:ident) => {
        impl Buffer {
            #[doc = concat!("Reads a `", stringify!($ty), "` at an absolute index, honoring byte order. Does not touch cursors.")]
            pub fn $get(&self, index: usize) -> Result<$ty> {
                let bytes = self.read_slice(index, $size)?;
                let mut arr = [0u8; $size];
                arr.copy_from_slice(bytes);
                Ok(match self.byte_order() {
                    ByteOrder::BigEndian => <$ty>::from_be_bytes(arr),
                    ByteOrder::LittleEndian => <$ty>::from_le_bytes(arr),
                })
            }

            #[doc = concat!("Writes a `", stringify!($ty), "` at an absolute index, honoring byte order. Does not touch cursors.")]
            pub fn $set(&self, index: usize, value: $ty) -> Result<()> {
                let bytes = match self.byte_order() {
                    ByteOrder::BigEndian => value.to_be_bytes(),
                    ByteOrder::LittleEndian => value.to_le_bytes(),
                };
                self.write_slice(index, $size)?.copy_from_slice(&bytes);
                Ok(())
            }

            #[doc = concat!("Reads a `", stringify!($ty), "` from the read cursor and advances it.")]
            pub fn $read(&self) -> Result<$ty> {
                let index = self.read_offset();
                let value = self.$get(index)?;
                self.cursors_mut().read_offset = index + $size;
                Ok(value)
            }

            #[doc = concat!("Writes a `", stringify!($ty), "` at the write cursor and advances it.")]
            pub fn $write(&self, value: $ty) -> Result<()> {
                let index = self.write_offset();
                self.$set(index, value)?;
                self.cursors_mut().write_offset = index + $size;
                Ok(())
            }
        }
    };
}

primitive_accessors!(u8, 1, get_u8, set_u8, read_u8, write_u8);
primitive_accessors!(i8, 1, get_i8, set_i8, read_i8, write_i8);
primitive_accessors!(u16, 2, get_u16, set_u16, read_u16, write_u16);
primitive_accessors!(i16, 2, get_i16, set_i16, read_i16, write_i16);
primitive_accessors!(u32, 4, get_u32, set_u32, read_u32, write_u32);
primitive_accessors!(i32, 4, get_i32, set_i32, read_i32, write_i32);
primitive_accessors!(u64, 8, get_u64, set_u64, read_u64, write_u64);
primitive_accessors!(i64, 8, get_i64, set_i64, read_i64, write_i64);
primitive_accessors!(f32, 4, get_f32, set_f32, read_f32, write_f32);
primitive_accessors!(f64, 8, get_f64, set_f64, read_f64, write_f64);

impl Buffer {
    /// Reads a 24-bit unsigned integer, zero-extended into a `u32`. There is
    /// no native `u24`, so this decomposes into three single-byte loads
    /// packed according to the buffer's byte order, matching Netty's
    /// `getUnsignedMedium`.
    pub fn get_u24(&self, index: usize) -> Result<u32> {
        let b = self.read_slice(index, 3)?;
        Ok(match self.byte_order() {
            ByteOrder::BigEndian => (b[0] as u32) << 16 | (b[1] as u32) << 8 | b[2] as u32,
            ByteOrder::LittleEndian => (b[2] as u32) << 16 | (b[1] as u32) << 8 | b[0] as u32,
        })
    }

    /// Reads a 24-bit signed integer, sign-extended into an `i32`.
    pub fn get_i24(&self, index: usize) -> Result<i32> {
        let unsigned = self.get_u24(index)?;
        Ok(((unsigned << 8) as i32) >> 8)
    }

    pub fn set_u24(&self, index: usize, value: u32) -> Result<()> {
        let out = self.write_slice(index, 3)?;
        match self.byte_order() {
            ByteOrder::BigEndian => {
                out[0] = (value >> 16) as u8;
                out[1] = (value >> 8) as u8;
                out[2] = value as u8;
            }
            ByteOrder::LittleEndian => {
                out[0] = value as u8;
                out[1] = (value >> 8) as u8;
                out[2] = (value >> 16) as u8;
            }
        }
        Ok(())
    }

    pub fn set_i24(&self, index: usize, value: i32) -> Result<()> {
        self.set_u24(index, (value as u32) & 0x00FF_FFFF)
    }

    pub fn read_u24(&self) -> Result<u32> {
        let index = self.read_offset();
        let value = self.get_u24(index)?;
        self.cursors_mut().read_offset = index + 3;
        Ok(value)
    }

    pub fn read_i24(&self) -> Result<i32> {
        let index = self.read_offset();
        let value = self.get_i24(index)?;
        self.cursors_mut().read_offset = index + 3;
        Ok(value)
    }

    pub fn write_u24(&self, value: u32) -> Result<()> {
        let index = self.write_offset();
        self.set_u24(index, value)?;
        self.cursors_mut().write_offset = index + 3;
        Ok(())
    }

    pub fn write_i24(&self, value: i32) -> Result<()> {
        let index = self.write_offset();
        self.set_i24(index, value)?;
        self.cursors_mut().write_offset = index + 3;
        Ok(())
    }
}
