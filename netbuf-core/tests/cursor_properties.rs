//! Property coverage for the cursor invariant `0 <= read_offset <= write_offset
//! <= capacity`, and for byte-order round trips, across arbitrary sequences
//! of accessor calls.

use std::sync::Arc;

use netbuf_core::{Buffer, ByteOrder, HeapMemoryManager};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    WriteByte(u8),
    ReadByte,
    SetWriteOffset(usize),
    SetReadOffset(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::WriteByte),
        Just(Op::ReadByte),
        (0usize..32).prop_map(Op::SetWriteOffset),
        (0usize..32).prop_map(Op::SetReadOffset),
    ]
}

proptest! {
    #[test]
    fn cursor_invariant_holds_after_any_sequence_of_accessor_calls(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let buf = Buffer::allocate(Arc::new(HeapMemoryManager), 16).unwrap();

        for op in ops {
            match op {
                Op::WriteByte(b) => { let _ = buf.write_u8(b); }
                Op::ReadByte => { let _ = buf.read_u8(); }
                Op::SetWriteOffset(n) => { let _ = buf.set_write_offset(n); }
                Op::SetReadOffset(n) => { let _ = buf.set_read_offset(n); }
            }

            let r = buf.read_offset();
            let w = buf.write_offset();
            let cap = buf.capacity();
            prop_assert!(r <= w, "read_offset {} exceeded write_offset {}", r, w);
            prop_assert!(w <= cap, "write_offset {} exceeded capacity {}", w, cap);
        }
    }

    #[test]
    fn u32_round_trips_through_both_byte_orders(value in any::<u32>(), big_endian in any::<bool>()) {
        let buf = Buffer::allocate(Arc::new(HeapMemoryManager), 4).unwrap();
        buf.set_byte_order(if big_endian { ByteOrder::BigEndian } else { ByteOrder::LittleEndian });
        buf.set_write_offset(4).unwrap();

        buf.write_u32(value).unwrap();
        buf.set_read_offset(0).unwrap();
        prop_assert_eq!(buf.read_u32().unwrap(), value);
    }

    #[test]
    fn i16_round_trips_at_an_arbitrary_offset(value in any::<i16>(), offset in 0usize..14) {
        let buf = Buffer::allocate(Arc::new(HeapMemoryManager), 16).unwrap();
        buf.set_write_offset(16).unwrap();

        buf.set_i16(offset, value).unwrap();
        prop_assert_eq!(buf.get_i16(offset).unwrap(), value);
    }
}
