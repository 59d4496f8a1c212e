//! Byte-at-a-time (and bulk) iteration over a fixed window of a buffer,
//! independent of the buffer's own read/write cursors.
//!
//! Unlike `read_u8`/friends, opening a cursor does not move
//! [`Buffer::read_offset`] or [`Buffer::write_offset`] — it walks a separate,
//! caller-specified `[start, start+length)` window. This is the primitive
//! composite buffers build their torn, cross-component reads on top of.

use crate::buffer::Buffer;
use crate::error::Result;

/// Forward byte cursor over `[start, start+length)` of a buffer, produced by
/// [`open_cursor`].
pub struct ByteCursor<'a> {
    buffer: &'a Buffer,
    pos: usize,
    end: usize,
}

/// Reverse byte cursor over the same window, walking from the high end down.
/// Bulk reads still pack bytes most-significant-first, so a reverse cursor's
/// `read_long` packs the bytes in the order it visits them, not the order
/// they sit in memory.
pub struct ReverseByteCursor<'a> {
    buffer: &'a Buffer,
    start: usize,
    pos: usize,
}

pub fn open_cursor(buffer: &Buffer, start: usize, length: usize) -> Result<ByteCursor<'_>> {
    if length == 0 {
        return Ok(ByteCursor { buffer, pos: start, end: start });
    }
    // bounds-check the whole window up front via its last byte
    let _ = buffer.get_u8(start + length - 1)?;
    Ok(ByteCursor { buffer, pos: start, end: start + length })
}

pub fn open_reverse_cursor(buffer: &Buffer, start: usize, length: usize) -> Result<ReverseByteCursor<'_>> {
    if length > 0 {
        let _ = buffer.get_u8(start + length - 1)?;
    }
    Ok(ReverseByteCursor { buffer, start, pos: start + length })
}

impl<'a> ByteCursor<'a> {
    pub fn bytes_left(&self) -> usize {
        self.end - self.pos
    }

    pub fn next_byte(&mut self) -> Option<u8> {
        if self.pos >= self.end {
            return None;
        }
        let b = self.buffer.get_u8(self.pos).ok()?;
        self.pos += 1;
        Some(b)
    }

    /// Packs up to the next 8 remaining bytes, most-significant-byte first,
    /// into a `u64`, returning the value and how many bytes it consumed
    /// (`1..=8`). Returns `None` once the window is exhausted.
    pub fn read_long(&mut self) -> Option<(u64, usize)> {
        if self.pos >= self.end {
            return None;
        }
        let count = (self.end - self.pos).min(8);
        let mut value: u64 = 0;
        for _ in 0..count {
            let b = self.next_byte()?;
            value = (value << 8) | b as u64;
        }
        Some((value, count))
    }
}

impl<'a> ReverseByteCursor<'a> {
    pub fn bytes_left(&self) -> usize {
        self.pos - self.start
    }

    pub fn next_byte(&mut self) -> Option<u8> {
        if self.pos <= self.start {
            return None;
        }
        self.pos -= 1;
        self.buffer.get_u8(self.pos).ok()
    }

    pub fn read_long(&mut self) -> Option<(u64, usize)> {
        if self.pos <= self.start {
            return None;
        }
        let count = (self.pos - self.start).min(8);
        let mut value: u64 = 0;
        for _ in 0..count {
            let b = self.next_byte()?;
            value = (value << 8) | b as u64;
        }
        Some((value, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::HeapMemoryManager;
    use std::sync::Arc;

    fn buffer_with(bytes: &[u8]) -> Buffer {
        let buf = Buffer::allocate(Arc::new(HeapMemoryManager), bytes.len()).unwrap();
        for (i, &b) in bytes.iter().enumerate() {
            buf.set_u8(i, b).unwrap();
        }
        buf.set_write_offset(bytes.len()).unwrap();
        buf
    }

    #[test]
    fn forward_cursor_visits_bytes_in_order() {
        let buf = buffer_with(&[1, 2, 3, 4]);
        let mut cursor = open_cursor(&buf, 0, 4).unwrap();
        let mut seen = Vec::new();
        while let Some(b) = cursor.next_byte() {
            seen.push(b);
        }
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[test]
    fn reverse_cursor_visits_bytes_backward() {
        let buf = buffer_with(&[1, 2, 3, 4]);
        let mut cursor = open_reverse_cursor(&buf, 0, 4).unwrap();
        let mut seen = Vec::new();
        while let Some(b) = cursor.next_byte() {
            seen.push(b);
        }
        assert_eq!(seen, vec![4, 3, 2, 1]);
    }

    #[test]
    fn read_long_packs_short_tail_correctly() {
        let buf = buffer_with(&[0xAA, 0xBB, 0xCC]);
        let mut cursor = open_cursor(&buf, 0, 3).unwrap();
        let (value, count) = cursor.read_long().unwrap();
        assert_eq!(count, 3);
        assert_eq!(value, 0x00AABBCC);
        assert!(cursor.read_long().is_none());
    }

    #[test]
    fn out_of_range_window_is_rejected() {
        let buf = buffer_with(&[1, 2]);
        assert!(open_cursor(&buf, 0, 5).is_err());
    }
}
