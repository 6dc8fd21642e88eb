// ==============================================
// CACHE REGISTRY TESTS (integration)
// ==============================================
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use freqcache::registry::CacheRegistry;

#[test]
fn test_concurrent_get_or_create_yields_one_instance() {
    let registry: Arc<CacheRegistry<u64, u64>> = Arc::new(CacheRegistry::new());
    let num_threads = 16;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let cache = registry.lfu("shared", 8 + thread_id);
                cache.insert(thread_id as u64, Duration::ZERO, 0);
                cache
            })
        })
        .collect();

    let caches: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for cache in &caches[1..] {
        assert!(Arc::ptr_eq(&caches[0], cache));
    }

    assert_eq!(registry.len(), 1);
    let shared = registry.get("shared").unwrap();
    assert!(shared.count() <= shared.capacity());
    shared.check_invariants().unwrap();
}

#[test]
fn test_registries_are_independent() {
    let left: CacheRegistry<u64, u64> = CacheRegistry::new();
    let right: CacheRegistry<u64, u64> = CacheRegistry::default();

    left.lfu("x", 2).insert(1, Duration::ZERO, 1);
    assert!(right.get("x").is_none());
    assert!(!right.lfu("x", 2).exists(&1));
}

#[test]
fn test_names_lists_registered_caches() {
    let registry: CacheRegistry<u64, u64> = CacheRegistry::new();
    for name in ["users", "accounts", "sessions"] {
        registry.lfu(name, 4);
    }
    registry.remove("sessions");
    assert_eq!(registry.names(), vec!["accounts".to_string(), "users".to_string()]);
}
