//! End-to-end contract coverage for [`netbuf::CompositeBuffer`]: torn
//! accessors across component boundaries, splitting, and composing from
//! transfer tokens.

use std::sync::Arc;

use netbuf::{Allocator, CompositeBuffer, HeapMemoryManager, MemoryManager};

fn component(allocator: &Allocator, bytes: &[u8]) -> netbuf::Buffer {
    let buf = allocator.allocate(bytes.len()).unwrap();
    buf.set_write_offset(bytes.len()).unwrap();
    for (i, &b) in bytes.iter().enumerate() {
        buf.set_u8(i, b).unwrap();
    }
    buf
}

fn manager() -> Arc<dyn MemoryManager> {
    Arc::new(HeapMemoryManager)
}

#[test]
fn torn_write_then_torn_read_round_trips_across_three_components() {
    let allocator = Allocator::heap();
    let mut composite = CompositeBuffer::compose(
        manager(),
        vec![
            component(&allocator, &[0; 1]),
            component(&allocator, &[0; 1]),
            component(&allocator, &[0; 6]),
        ],
    )
    .unwrap();
    composite.set_write_offset(0).unwrap();

    composite.write_u64(0xFEED_FACE_CAFE_F00Du64).unwrap();
    composite.set_read_offset(0).unwrap();
    assert_eq!(composite.read_u64().unwrap(), 0xFEED_FACE_CAFE_F00D);
}

#[test]
fn split_produces_independently_addressable_halves() {
    let allocator = Allocator::heap();
    let mut composite = CompositeBuffer::compose(
        manager(),
        vec![component(&allocator, &[1, 2, 3]), component(&allocator, &[4, 5, 6])],
    )
    .unwrap();
    composite.set_write_offset(6).unwrap();

    let mut left = composite.split(4).unwrap();
    assert_eq!(left.capacity(), 4);
    assert_eq!(composite.capacity(), 2);
    assert_eq!(left.read_u32().unwrap(), 0x0102_0304);
    assert_eq!(composite.read_u16().unwrap(), 0x0506);
}

#[test]
fn compose_sends_receives_every_token_in_order() {
    let allocator = Allocator::heap();
    let first = component(&allocator, &[1, 2]);
    let second = component(&allocator, &[3, 4]);
    let tokens = vec![first.send().unwrap(), second.send().unwrap()];

    let mut composite = CompositeBuffer::compose_sends(manager(), tokens).unwrap();
    composite.set_write_offset(4).unwrap();
    assert_eq!(composite.read_u32().unwrap(), 0x0102_0304);
}

#[test]
fn compose_sends_propagates_a_double_received_token_error() {
    let allocator = Allocator::heap();
    let buf = component(&allocator, &[1, 2]);
    let token = buf.send().unwrap();
    let _ = token.receive().unwrap();

    let err = CompositeBuffer::compose_sends(manager(), vec![token]);
    assert!(err.is_err());
}

#[test]
fn ensure_writable_grows_by_appending_a_component() {
    let allocator = Allocator::heap();
    let mut composite = CompositeBuffer::compose(manager(), vec![component(&allocator, &[1])]).unwrap();
    composite.set_write_offset(1).unwrap();

    let components_before = composite.component_count();
    composite.ensure_writable(32, 0, false).unwrap();
    assert!(composite.component_count() > components_before);
    assert!(composite.writable_bytes() >= 32);
}
