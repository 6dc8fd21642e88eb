// ==============================================
// LFU CONCURRENCY TESTS (integration)
// ==============================================
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use freqcache::entry::CacheItem;
use freqcache::policy::lfu::LfuCache;

mod shared_access {
    use super::*;

    #[test]
    fn test_mixed_operations_keep_invariants() {
        let cache: Arc<LfuCache<String, usize>> = Arc::new(LfuCache::new("mixed", 64));
        let num_threads = 8;
        let operations_per_thread = 500;
        let barrier = Arc::new(Barrier::new(num_threads));

        let handles: Vec<_> = (0..num_threads)
            .map(|thread_id| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);

                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..operations_per_thread {
                        let key = format!("key_{}", (thread_id * 7 + i) % 128);
                        match i % 5 {
                            0 | 1 => {
                                cache.insert(key, Duration::ZERO, i);
                            },
                            2 | 3 => {
                                let _ = cache.get(&key);
                            },
                            _ => {
                                let _ = cache.delete(&key);
                            },
                        }
                        assert!(cache.count() <= cache.capacity());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.count() <= 64);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_concurrent_reads_count_every_access() {
        let cache: Arc<LfuCache<u32, u32>> = Arc::new(LfuCache::new("reads", 4));
        cache.insert(1, Duration::ZERO, 1);

        let num_threads = 8;
        let reads_per_thread = 1_000;
        let barrier = Arc::new(Barrier::new(num_threads));

        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..reads_per_thread {
                        cache.get(&1).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let expected = 1 + (num_threads * reads_per_thread) as u64;
        assert_eq!(cache.frequency(&1), Some(expected));
        assert_eq!(cache.get(&1).unwrap().access_count(), expected + 1);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_concurrent_inserts_respect_capacity() {
        let cache: Arc<LfuCache<u64, u64>> = Arc::new(LfuCache::new("inserts", 32));
        let handles: Vec<_> = (0..4u64)
            .map(|thread_id| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..1_000u64 {
                        cache.insert(thread_id * 10_000 + i, Duration::ZERO, i);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.count(), 32);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_flush_while_writing() {
        let cache: Arc<LfuCache<u32, u32>> = Arc::new(LfuCache::new("flush", 16));
        let deleted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&deleted);
        cache.add_about_to_delete_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let writer = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..2_000 {
                    cache.insert(i % 40, Duration::ZERO, i);
                }
            })
        };
        let flusher = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..50 {
                    cache.flush();
                    thread::yield_now();
                }
            })
        };

        writer.join().unwrap();
        flusher.join().unwrap();
        cache.check_invariants().unwrap();
        assert!(cache.count() <= 16);
    }
}

mod loader_race {
    use super::*;

    #[test]
    fn test_resident_entry_wins_over_loaded_item() {
        let cache: Arc<LfuCache<&'static str, &'static str>> = Arc::new(LfuCache::new("race", 4));
        let loading = Arc::new(Barrier::new(2));
        let inserted = Arc::new(Barrier::new(2));

        {
            let loading = Arc::clone(&loading);
            let inserted = Arc::clone(&inserted);
            cache.set_data_loader(move |key, _| {
                // Hand control to the writer, then wait for its insert to land.
                loading.wait();
                inserted.wait();
                Some(CacheItem::new(*key, Duration::ZERO, "loaded"))
            });
        }

        let reader = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get(&"key").unwrap())
        };

        loading.wait();
        let written = cache.insert("key", Duration::ZERO, "written");
        inserted.wait();

        let read = reader.join().unwrap();
        assert!(Arc::ptr_eq(&read, &written));
        assert_eq!(*read.data(), "written");
        assert_eq!(cache.count(), 1);
        assert_eq!(cache.frequency(&"key"), Some(2));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_concurrent_misses_admit_key_once() {
        let cache: Arc<LfuCache<u32, u32>> = Arc::new(LfuCache::new("misses", 8));
        let loads = Arc::new(AtomicUsize::new(0));
        let added = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&loads);
        cache.set_data_loader(move |key, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(CacheItem::new(*key, Duration::ZERO, key * 2))
        });
        let counter = Arc::clone(&added);
        cache.add_added_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let num_threads = 8;
        let barrier = Arc::new(Barrier::new(num_threads));
        let handles: Vec<_> = (0..num_threads)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    *cache.get(&21).unwrap().data()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }

        assert!(loads.load(Ordering::SeqCst) >= 1);
        assert_eq!(added.load(Ordering::SeqCst), 1);
        assert_eq!(cache.count(), 1);
        assert_eq!(cache.frequency(&21), Some(num_threads as u64));
        cache.check_invariants().unwrap();
    }
}
