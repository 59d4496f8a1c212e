//! A non-copy concatenation of buffer components presenting itself as a
//! single buffer.
//!
//! Unlike [`netbuf_core::Buffer`], a `CompositeBuffer` is not itself
//! `Arc`-shared — it owns its component list outright, so "requires sole
//! ownership" for the component-rewriting operations (`split`, `compact`,
//! `ensure_writable`) falls out of `&mut self` rather than needing its own
//! ownership-state machine.

use std::sync::Arc;

use netbuf_core::{Buffer, BufferError, BufferRecycler, ByteOrder, MemoryManager, NullRecycler, Result};

/// Concatenates `components` into one addressable byte range, dispatching
/// every accessor to the owning component (or, at a boundary, tearing the
/// access across two or more).
pub struct CompositeBuffer {
    components: Vec<Buffer>,
    /// `offsets[i]` is the absolute start offset of `components[i]`;
    /// `offsets[components.len()]` is the total capacity.
    offsets: Vec<usize>,
    byte_order: ByteOrder,
    read_only: bool,
    read_offset: usize,
    write_offset: usize,
    allocator: Arc<dyn MemoryManager>,
    recycler: Arc<dyn BufferRecycler>,
}

fn rebuild_offsets(components: &[Buffer]) -> Result<Vec<usize>> {
    let mut offsets = Vec::with_capacity(components.len() + 1);
    let mut total = 0usize;
    offsets.push(0);
    for c in components {
        total = total
            .checked_add(c.capacity())
            .ok_or_else(|| BufferError::invalid_composition("total composite capacity overflows usize"))?;
        offsets.push(total);
    }
    Ok(offsets)
}

fn check_duplicates(components: &[Buffer]) -> Result<()> {
    for i in 0..components.len() {
        for j in (i + 1)..components.len() {
            if components[i].identity() == components[j].identity() {
                return Err(BufferError::invalid_composition("duplicate component identity"));
            }
        }
    }
    Ok(())
}

fn check_uniform(components: &[Buffer]) -> Result<(ByteOrder, bool)> {
    let first = components
        .first()
        .map(|c| (c.byte_order(), c.is_read_only()))
        .unwrap_or((ByteOrder::NATIVE, false));
    for c in components {
        if c.byte_order() != first.0 {
            return Err(BufferError::invalid_composition("components disagree on byte order"));
        }
        if c.is_read_only() != first.1 {
            return Err(BufferError::invalid_composition("components disagree on read-only flag"));
        }
    }
    Ok(first)
}

impl CompositeBuffer {
    /// Composes already-acquired buffers. Zero-capacity components are
    /// filtered out; an empty result is a valid, zero-capacity composite.
    pub fn compose(allocator: Arc<dyn MemoryManager>, components: Vec<Buffer>) -> Result<CompositeBuffer> {
        Self::compose_with_recycler(allocator, Arc::new(NullRecycler), components)
    }

    pub fn compose_with_recycler(
        allocator: Arc<dyn MemoryManager>,
        recycler: Arc<dyn BufferRecycler>,
        components: Vec<Buffer>,
    ) -> Result<CompositeBuffer> {
        let components: Vec<Buffer> = components.into_iter().filter(|c| c.capacity() > 0).collect();
        check_duplicates(&components)?;
        let (byte_order, read_only) = check_uniform(&components)?;
        let offsets = rebuild_offsets(&components)?;
        let write_offset = offsets.last().copied().unwrap_or(0);
        tracing::debug!(components = components.len(), capacity = write_offset, "composite buffer composed");
        Ok(CompositeBuffer {
            components,
            offsets,
            byte_order,
            read_only,
            read_offset: 0,
            write_offset,
            allocator,
            recycler,
        })
    }

    /// Composes from one-shot transfer tokens: receives each in order; if
    /// any receive fails, discards the remaining tokens and closes the
    /// buffers already received, then propagates the error.
    pub fn compose_sends(
        allocator: Arc<dyn MemoryManager>,
        sends: Vec<netbuf_core::SendToken>,
    ) -> Result<CompositeBuffer> {
        let mut received = Vec::with_capacity(sends.len());
        let mut iter = sends.into_iter();
        for token in iter.by_ref() {
            match token.receive() {
                Ok(buffer) => received.push(buffer),
                Err(err) => {
                    for leftover in iter {
                        leftover.discard();
                    }
                    for buffer in received {
                        buffer.close();
                    }
                    return Err(err);
                }
            }
        }
        Self::compose(allocator, received)
    }

    pub fn capacity(&self) -> usize {
        *self.offsets.last().unwrap_or(&0)
    }

    pub fn read_offset(&self) -> usize {
        self.read_offset
    }

    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    pub fn readable_bytes(&self) -> usize {
        self.write_offset - self.read_offset
    }

    pub fn writable_bytes(&self) -> usize {
        self.capacity() - self.write_offset
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn make_read_only(&mut self) {
        self.read_only = true;
        for c in &self.components {
            c.make_read_only();
        }
    }

    pub fn set_read_offset(&mut self, offset: usize) -> Result<()> {
        if offset > self.write_offset {
            return Err(BufferError::index_out_of_range(offset, self.write_offset, self.capacity()));
        }
        self.read_offset = offset;
        Ok(())
    }

    pub fn set_write_offset(&mut self, offset: usize) -> Result<()> {
        let cap = self.capacity();
        if offset > cap || offset < self.read_offset {
            return Err(BufferError::index_out_of_range(offset, self.read_offset, cap));
        }
        self.write_offset = offset;
        Ok(())
    }

    /// Binary search for the component owning absolute index `index`,
    /// returning `(component_index, offset_within_component)`.
    fn locate(&self, index: usize) -> (usize, usize) {
        // `offsets` is sorted and has one more entry than `components`; find
        // the last start offset not exceeding `index`.
        let component = self.offsets.partition_point(|&start| start <= index).saturating_sub(1);
        (component, index - self.offsets[component])
    }

    fn require_read_window(&self, op: &'static str, index: usize, len: usize) -> Result<()> {
        if index.checked_add(len).is_none_or(|end| end > self.write_offset) {
            return Err(BufferError::index_out_of_range(index + len, self.write_offset, self.capacity()));
        }
        let _ = op;
        Ok(())
    }

    fn require_write_window(&self, op: &'static str, index: usize, len: usize) -> Result<()> {
        if self.read_only {
            return Err(BufferError::read_only(op));
        }
        let cap = self.capacity();
        if index.checked_add(len).is_none_or(|end| end > cap) {
            return Err(BufferError::index_out_of_range(index + len, self.write_offset, cap));
        }
        Ok(())
    }

    fn get_byte_raw(&self, index: usize) -> Result<u8> {
        let (ci, off) = self.locate(index);
        self.components[ci].get_u8(off)
    }

    fn set_byte_raw(&self, index: usize, value: u8) -> Result<()> {
        let (ci, off) = self.locate(index);
        self.components[ci].set_u8(off, value)
    }

    /// Appends a single new component in place, flattening is not attempted
    /// (a `CompositeBuffer` is never itself a component — see crate docs).
    pub fn extend_with(&mut self, buffer: Buffer) -> Result<()> {
        if buffer.capacity() == 0 {
            return Ok(());
        }
        if self.components.is_empty() {
            self.byte_order = buffer.byte_order();
            self.read_only = buffer.is_read_only();
        } else {
            if buffer.byte_order() != self.byte_order {
                return Err(BufferError::invalid_composition("extension disagrees on byte order"));
            }
            if buffer.is_read_only() != self.read_only {
                return Err(BufferError::invalid_composition("extension disagrees on read-only flag"));
            }
        }
        if self.components.iter().any(|c| c.identity() == buffer.identity()) {
            return Err(BufferError::invalid_composition("duplicate component identity"));
        }
        let added = buffer.capacity();
        let added_readable = buffer.write_offset();
        self.components.push(buffer);
        let new_total = self
            .capacity()
            .checked_add(added)
            .ok_or_else(|| BufferError::invalid_composition("total composite capacity overflows usize"))?;
        self.offsets.push(new_total);
        self.write_offset += added_readable;
        Ok(())
    }

    fn read_byte_into(&self, index: usize, out: &mut [u8]) -> Result<()> {
        self.require_read_window("read", index, out.len())?;
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.get_byte_raw(index + i)?;
        }
        Ok(())
    }

    fn write_byte_from(&self, op: &'static str, index: usize, bytes: &[u8]) -> Result<()> {
        self.require_write_window(op, index, bytes.len())?;
        for (i, &b) in bytes.iter().enumerate() {
            self.set_byte_raw(index + i, b)?;
        }
        Ok(())
    }

    pub fn fill(&self, value: u8) -> Result<()> {
        if self.read_only {
            return Err(BufferError::read_only("fill"));
        }
        for c in &self.components {
            c.fill(value)?;
        }
        Ok(())
    }

    pub fn copy_into_slice(&self, src_offset: usize, dst: &mut [u8], len: usize) -> Result<()> {
        self.read_byte_into(src_offset, &mut dst[..len])
    }

    /// Partitions this composite at `at`: whole components before the split
    /// point go to the returned (left) composite, the straddling component
    /// is itself split at the local boundary, and the remaining components
    /// stay in `self` (the right side).
    pub fn split(&mut self, at: usize) -> Result<CompositeBuffer> {
        let cap = self.capacity();
        if at > cap {
            return Err(BufferError::index_out_of_range(at, self.write_offset, cap));
        }
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut consumed = 0usize;
        for mut component in std::mem::take(&mut self.components) {
            let len = component.capacity();
            if consumed + len <= at {
                left.push(component);
            } else if consumed >= at {
                right.push(component);
            } else {
                let local_at = at - consumed;
                let piece = component.split(local_at)?;
                left.push(piece);
                right.push(component);
            }
            consumed += len;
        }

        let original_read = self.read_offset;
        let original_write = self.write_offset;

        let mut left_composite = CompositeBuffer::compose_with_recycler(
            Arc::clone(&self.allocator),
            Arc::clone(&self.recycler),
            left,
        )?;
        left_composite.read_offset = original_read.min(at);
        left_composite.write_offset = original_write.min(at);

        let mut right_composite = CompositeBuffer::compose_with_recycler(
            Arc::clone(&self.allocator),
            Arc::clone(&self.recycler),
            right,
        )?;
        right_composite.read_offset = original_read.saturating_sub(at).min(right_composite.capacity());
        right_composite.write_offset = original_write.saturating_sub(at).min(right_composite.capacity());

        *self = right_composite;
        Ok(left_composite)
    }

    /// Splits at the nearest component boundary `<= at`, never breaking a component.
    pub fn split_components_floor(&mut self, at: usize) -> Result<CompositeBuffer> {
        let boundary = self.offsets.iter().rev().find(|&&o| o <= at).copied().unwrap_or(0);
        self.split(boundary)
    }

    /// Splits at the nearest component boundary `>= at`, never breaking a component.
    pub fn split_components_ceil(&mut self, at: usize) -> Result<CompositeBuffer> {
        let boundary = self.offsets.iter().find(|&&o| o >= at).copied().unwrap_or(self.capacity());
        self.split(boundary)
    }

    /// Drops fully consumed leading components and, for the new first
    /// component, compacts it in place if it is solely owned. Resets the
    /// composite's own cursors to match.
    pub fn compact(&mut self) -> Result<()> {
        if self.read_only {
            return Err(BufferError::read_only("compact"));
        }
        let read_offset = self.read_offset;
        let write_offset = self.write_offset;
        let mut consumed = 0usize;
        let mut kept = Vec::new();
        for component in std::mem::take(&mut self.components) {
            let len = component.capacity();
            if consumed + len <= read_offset {
                component.close();
            } else {
                kept.push(component);
            }
            consumed += len;
        }
        if let Some(first) = kept.first_mut() {
            if first.ownership_state().is_owned() {
                let _ = first.compact();
            }
        }
        self.offsets = rebuild_offsets(&kept)?;
        self.components = kept;
        self.write_offset = write_offset - read_offset.min(write_offset);
        self.read_offset = 0;
        Ok(())
    }

    /// Guarantees at least `size` writable bytes, compacting first if
    /// `allow_compaction`, then appending a fresh component allocated
    /// through this composite's allocator if that is still not enough.
    pub fn ensure_writable(&mut self, size: usize, min_growth: usize, allow_compaction: bool) -> Result<()> {
        if self.writable_bytes() >= size {
            return Ok(());
        }
        if allow_compaction {
            self.compact()?;
            if self.writable_bytes() >= size {
                return Ok(());
            }
        }
        let shortfall = size.saturating_sub(self.writable_bytes());
        let growth = shortfall.max(min_growth).max(1);
        tracing::debug!(growth, "composite buffer growing by appending a new component");
        let new_component =
            Buffer::allocate_with_recycler(Arc::clone(&self.allocator), Arc::clone(&self.recycler), growth)?;
        if new_component.byte_order() != self.byte_order {
            new_component.set_byte_order(self.byte_order);
        }
        self.extend_with(new_component)
    }

    /// Visits each component with non-zero readable bytes, stopping early
    /// if `visit` returns `false`. Returns the count visited, negated if it
    /// stopped early.
    pub fn for_each_readable<F>(&self, mut visit: F) -> i64
    where
        F: FnMut(&Buffer, usize, usize) -> bool,
    {
        let mut count = 0i64;
        for (i, component) in self.components.iter().enumerate() {
            let start = self.offsets[i];
            let end = self.offsets[i + 1];
            if end <= self.read_offset || start >= self.write_offset {
                continue;
            }
            let local_start = self.read_offset.saturating_sub(start);
            let local_end = (self.write_offset - start).min(end - start);
            if local_end <= local_start {
                continue;
            }
            count += 1;
            if !visit(component, local_start, local_end - local_start) {
                return -count;
            }
        }
        count
    }

    /// Visits each component with non-zero writable bytes, same early-stop
    /// contract as [`CompositeBuffer::for_each_readable`].
    pub fn for_each_writable<F>(&self, mut visit: F) -> i64
    where
        F: FnMut(&Buffer, usize, usize) -> bool,
    {
        let mut count = 0i64;
        for (i, component) in self.components.iter().enumerate() {
            let start = self.offsets[i];
            let end = self.offsets[i + 1];
            if end <= self.write_offset {
                continue;
            }
            let local_start = self.write_offset.saturating_sub(start);
            let local_end = end - start;
            if local_end <= local_start {
                continue;
            }
            count += 1;
            if !visit(component, local_start, local_end - local_start) {
                return -count;
            }
        }
        count
    }
}

macro_rules! torn_accessors {
    ($ty:ty, $size:literal, $get:ident, $set:ident, $read:ident, $write:ident) => {
        impl CompositeBuffer {
            pub fn $get(&self, index: usize) -> Result<$ty> {
                let mut arr = [0u8; $size];
                self.read_byte_into(index, &mut arr)?;
                Ok(match self.byte_order {
                    ByteOrder::BigEndian => <$ty>::from_be_bytes(arr),
                    ByteOrder::LittleEndian => <$ty>::from_le_bytes(arr),
                })
            }

            pub fn $set(&self, index: usize, value: $ty) -> Result<()> {
                let bytes = match self.byte_order {
                    ByteOrder::BigEndian => value.to_be_bytes(),
                    ByteOrder::LittleEndian => value.to_le_bytes(),
                };
                self.write_byte_from(stringify!($set), index, &bytes)
            }

            pub fn $read(&mut self) -> Result<$ty> {
                let index = self.read_offset;
                let value = self.$get(index)?;
                self.read_offset = index + $size;
                Ok(value)
            }

            pub fn $write(&mut self, value: $ty) -> Result<()> {
                let index = self.write_offset;
                self.$set(index, value)?;
                self.write_offset = index + $size;
                Ok(())
            }
        }
    };
}

torn_accessors!(u8, 1, get_u8, set_u8, read_u8, write_u8);
torn_accessors!(i8, 1, get_i8, set_i8, read_i8, write_i8);
torn_accessors!(u16, 2, get_u16, set_u16, read_u16, write_u16);
torn_accessors!(i16, 2, get_i16, set_i16, read_i16, write_i16);
torn_accessors!(u32, 4, get_u32, set_u32, read_u32, write_u32);
torn_accessors!(i32, 4, get_i32, set_i32, read_i32, write_i32);
torn_accessors!(u64, 8, get_u64, set_u64, read_u64, write_u64);
torn_accessors!(i64, 8, get_i64, set_i64, read_i64, write_i64);
torn_accessors!(f32, 4, get_f32, set_f32, read_f32, write_f32);
torn_accessors!(f64, 8, get_f64, set_f64, read_f64, write_f64);

#[cfg(test)]
mod tests {
    use super::*;
    use netbuf_core::HeapMemoryManager;

    fn component(bytes: &[u8]) -> Buffer {
        let manager = Arc::new(HeapMemoryManager);
        let buf = Buffer::allocate(manager, bytes.len()).unwrap();
        for (i, &b) in bytes.iter().enumerate() {
            buf.set_u8(i, b).unwrap();
        }
        buf.set_write_offset(bytes.len()).unwrap();
        buf
    }

    fn manager() -> Arc<dyn MemoryManager> {
        Arc::new(HeapMemoryManager)
    }

    #[test]
    fn capacity_is_sum_of_components() {
        let composite =
            CompositeBuffer::compose(manager(), vec![component(&[1, 2]), component(&[3, 4, 5])]).unwrap();
        assert_eq!(composite.capacity(), 5);
    }

    #[test]
    fn torn_read_spans_component_boundary() {
        let mut composite =
            CompositeBuffer::compose(manager(), vec![component(&[0x01, 0x02]), component(&[0x03, 0x04])])
                .unwrap();
        assert_eq!(composite.get_u32(0).unwrap(), 0x0102_0304);
        assert_eq!(composite.read_u16().unwrap(), 0x0102);
        assert_eq!(composite.read_u16().unwrap(), 0x0304);
    }

    #[test]
    fn rejects_duplicate_component() {
        let c = component(&[1]);
        let dup = c.acquire();
        assert!(CompositeBuffer::compose(manager(), vec![c, dup]).is_err());
    }

    #[test]
    fn rejects_mismatched_byte_order() {
        let a = component(&[1]);
        let b = component(&[2]);
        b.set_byte_order(ByteOrder::LittleEndian);
        a.set_byte_order(ByteOrder::BigEndian);
        assert!(CompositeBuffer::compose(manager(), vec![a, b]).is_err());
    }

    #[test]
    fn split_never_aliases_bytes() {
        let mut composite =
            CompositeBuffer::compose(manager(), vec![component(&[1, 2, 3]), component(&[4, 5, 6])]).unwrap();
        composite.set_write_offset(6).unwrap();
        let mut left = composite.split(4).unwrap();
        assert_eq!(left.capacity(), 4);
        assert_eq!(composite.capacity(), 2);
        assert_eq!(left.read_u32().unwrap(), 0x0102_0304);
        assert_eq!(composite.read_u16().unwrap(), 0x0506);
    }

    #[test]
    fn split_components_floor_never_breaks_a_component() {
        let mut composite =
            CompositeBuffer::compose(manager(), vec![component(&[1, 2]), component(&[3, 4, 5])]).unwrap();
        let left = composite.split_components_floor(3).unwrap();
        assert_eq!(left.capacity(), 2);
        assert_eq!(composite.capacity(), 3);
    }

    #[test]
    fn for_each_readable_counts_and_stops_early() {
        let composite =
            CompositeBuffer::compose(manager(), vec![component(&[1, 2]), component(&[3, 4, 5])]).unwrap();
        let mut visited = 0;
        let result = composite.for_each_readable(|_buf, _off, _len| {
            visited += 1;
            false
        });
        assert_eq!(result, -1);
        assert_eq!(visited, 1);
    }

    #[test]
    fn compact_drops_fully_consumed_leading_components() {
        let mut composite =
            CompositeBuffer::compose(manager(), vec![component(&[1, 2]), component(&[3, 4, 5])]).unwrap();
        composite.read_u16().unwrap();
        composite.compact().unwrap();
        assert_eq!(composite.component_count(), 1);
        assert_eq!(composite.capacity(), 3);
        assert_eq!(composite.read_offset(), 0);
    }

    #[test]
    fn ensure_writable_appends_new_component() {
        let mut composite = CompositeBuffer::compose(manager(), vec![component(&[1])]).unwrap();
        composite.set_write_offset(1).unwrap();
        composite.ensure_writable(8, 0, false).unwrap();
        assert!(composite.component_count() >= 2);
        assert!(composite.writable_bytes() >= 8);
    }
}
