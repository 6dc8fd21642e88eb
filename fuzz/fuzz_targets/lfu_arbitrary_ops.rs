#![no_main]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use freqcache::entry::CacheItem;
use freqcache::policy::lfu::LfuCache;
use libfuzzer_sys::fuzz_target;

// Arbitrary operation sequences against the cache. The first byte picks the
// capacity; every following pair is (op, key).
fuzz_target!(|data: &[u8]| {
    let Some((&cap, ops)) = data.split_first() else {
        return;
    };
    let cache: LfuCache<u8, u8> = LfuCache::new("fuzz", usize::from(cap % 16));

    let added = Arc::new(AtomicUsize::new(0));
    let removed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&added);
    cache.add_added_callback(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });
    let counter = Arc::clone(&removed);
    cache.add_about_to_delete_callback(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });
    cache.set_data_loader(|key, _| (key % 3 == 0).then(|| CacheItem::new(*key, Duration::ZERO, *key)));

    for chunk in ops.chunks_exact(2) {
        let key = chunk[1] % 48;

        match chunk[0] % 7 {
            0 | 1 => {
                cache.insert(key, Duration::ZERO, key);
            },
            2 | 3 => {
                let before = cache.frequency(&key);
                if let Ok(item) = cache.get(&key) {
                    if let Some(freq) = before {
                        assert_eq!(item.access_count(), freq + 1);
                    }
                }
            },
            4 => {
                let existed = cache.exists(&key);
                assert_eq!(cache.delete(&key).is_ok(), existed);
            },
            5 => {
                let ranked = cache.most_accessed(usize::from(key));
                assert!(ranked.len() <= cache.count());
                assert!(ranked.windows(2).all(|w| w[0].access_count() >= w[1].access_count()));
            },
            _ => cache.flush(),
        }

        assert!(cache.count() <= cache.capacity());
        if let Err(err) = cache.check_invariants() {
            panic!("{err}");
        }
        assert_eq!(
            added.load(Ordering::Relaxed) - removed.load(Ordering::Relaxed),
            cache.count()
        );
    }
});
