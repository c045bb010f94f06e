mod common;

use std::thread::scope;
use std::time::Duration;

use crossbeam::channel::bounded;
use oncecache::{InMemoryCache, KeyedCache};

use common::init_tracing;

#[test]
fn test_keyed_no_block_disjoint() {
    init_tracing();
    let cache = &KeyedCache::<u32, u32>::new();

    scope(|s| {
        // T1 blocks while inserting 1.
        let (t1_quit_sender, t1_quit_receiver) = bounded(0);
        let _ = s.spawn(move || {
            let _ = cache.get_or_set(1, || {
                t1_quit_receiver.recv().unwrap();
                1
            });
        });

        // T2 must not be blocked by T1 when inserting 2.
        let (t2_done_sender, t2_done_receiver) = bounded(0);
        let _ = s.spawn(move || {
            let _ = cache.get_or_set(2, || 2);
            t2_done_sender.send(()).unwrap();
        });

        // If T2 is blocked, then this will time out.
        t2_done_receiver
            .recv_timeout(Duration::from_secs(3))
            .expect("Inserting a different key should not block");

        // clean up
        t1_quit_sender.send(()).unwrap();
    });

    assert_eq!(cache.get(&1), Some(1));
    assert_eq!(cache.get(&2), Some(2));
}

#[test]
fn test_keyed_no_reader_block() {
    init_tracing();
    let cache = &KeyedCache::<u32, u32>::new();

    scope(|s| {
        let (t1_quit_sender, t1_quit_receiver) = bounded(0);
        let (t3_done_sender, t3_done_receiver) = bounded(0);

        // T1 blocks while inserting 1.
        let _ = s.spawn(move || {
            let _ = cache.get_or_set(1, || {
                // T2 waits on T1's computation when reading 1
                let _ = s.spawn(move || assert_eq!(cache.get_or_set(1, || panic!()), 1));

                // T3 should not be blocked when inserting 3.
                let _ = s.spawn(move || {
                    let _ = cache.get_or_set(3, || 3);
                    t3_done_sender.send(()).unwrap();
                });

                // block T1
                t1_quit_receiver.recv().unwrap();
                1
            });
        });

        // If T3 is blocked, then this will time out.
        t3_done_receiver
            .recv_timeout(Duration::from_secs(3))
            .expect("Inserting a different key should not block");

        // clean up
        t1_quit_sender.send(()).unwrap();
    });

    // T2 either waited on T1's cell or arrived after it was filled
    assert_eq!(cache.stats().computations(), 2);
    assert_eq!(cache.stats().hits() + cache.stats().contended_hits(), 1);
}

#[test]
fn test_in_memory_compute_blocks_other_keys() {
    init_tracing();
    let cache = &InMemoryCache::<u32, u32>::new();

    scope(|s| {
        let (t1_started_sender, t1_started_receiver) = bounded(0);
        let (t1_quit_sender, t1_quit_receiver) = bounded(0);
        let _ = s.spawn(move || {
            let _ = cache.get_or_set(1, || {
                t1_started_sender.send(()).unwrap();
                t1_quit_receiver.recv().unwrap();
                1
            });
        });
        t1_started_receiver.recv().unwrap();

        // The table-wide lock is held by T1's computation, so T2 waits.
        let (t2_done_sender, t2_done_receiver) = bounded(1);
        let _ = s.spawn(move || {
            let _ = cache.get_or_set(2, || 2);
            t2_done_sender.send(()).unwrap();
        });
        assert!(t2_done_receiver
            .recv_timeout(Duration::from_millis(200))
            .is_err());

        // Once T1 finishes, T2 gets through.
        t1_quit_sender.send(()).unwrap();
        t2_done_receiver
            .recv_timeout(Duration::from_secs(3))
            .expect("T2 should finish once T1 releases the lock");
    });

    assert_eq!(cache.len(), 2);
}

#[test]
fn test_in_memory_hits_do_not_wait_on_each_other() {
    init_tracing();
    let cache = &InMemoryCache::<u32, u32>::new();
    let _ = cache.get_or_set(1, || 1);

    scope(|s| {
        // Many readers on a present key at once
        let (done_sender, done_receiver) = bounded(16);
        for _ in 0..16 {
            let done_sender = done_sender.clone();
            let _ = s.spawn(move || {
                for _ in 0..1000 {
                    assert_eq!(cache.get_or_set(1, || panic!()), 1);
                    assert_eq!(cache.get(&1), Some(1));
                }
                done_sender.send(()).unwrap();
            });
        }
        for _ in 0..16 {
            done_receiver
                .recv_timeout(Duration::from_secs(3))
                .expect("Readers of an existing key should not block");
        }
    });

    assert_eq!(cache.stats().hits(), 16 * 1000);
    assert_eq!(cache.stats().computations(), 1);
}
