#![cfg(loom)]

//! `ArenaMetrics::active_chunks` is incremented when a chunk is grown and
//! decremented when the last allocation in it is freed, from whatever thread
//! happens to be allocating or freeing at the time. This models that counter
//! in isolation (growth/free of a single chunk slot) rather than through the
//! full `spin::Mutex`-guarded arena, since loom only instruments the atomics
//! it owns and `spin::Mutex` is opaque to it; the pairing under test is the
//! same fetch_add/fetch_sub the real arena performs under its lock.

use loom::sync::atomic::{AtomicUsize, Ordering};
use loom::sync::Arc;
use loom::thread;

#[test]
fn growth_and_drain_of_one_chunk_leaves_the_counter_at_zero() {
    loom::model(|| {
        let active_chunks = Arc::new(AtomicUsize::new(0));

        let grower = {
            let active_chunks = Arc::clone(&active_chunks);
            thread::spawn(move || {
                active_chunks.fetch_add(1, Ordering::Relaxed);
            })
        };

        grower.join().unwrap();

        let drainer = {
            let active_chunks = Arc::clone(&active_chunks);
            thread::spawn(move || {
                active_chunks.fetch_sub(1, Ordering::Relaxed);
            })
        };

        drainer.join().unwrap();

        assert_eq!(active_chunks.load(Ordering::Relaxed), 0);
    });
}

#[test]
fn two_concurrent_allocations_each_register_their_own_chunk() {
    loom::model(|| {
        let active_chunks = Arc::new(AtomicUsize::new(0));

        let a = {
            let active_chunks = Arc::clone(&active_chunks);
            thread::spawn(move || {
                active_chunks.fetch_add(1, Ordering::Relaxed);
            })
        };
        let b = {
            let active_chunks = Arc::clone(&active_chunks);
            thread::spawn(move || {
                active_chunks.fetch_add(1, Ordering::Relaxed);
            })
        };

        a.join().unwrap();
        b.join().unwrap();

        assert_eq!(active_chunks.load(Ordering::Relaxed), 2);
    });
}
