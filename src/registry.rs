//! Named cache lookup.
//!
//! A [`CacheRegistry`] maps names to shared [`LfuCache`] instances. Callers own
//! the registry and pass it around; there is no process-global table.
//!
//! ```
//! use std::sync::Arc;
//! use freqcache::registry::CacheRegistry;
//!
//! let registry: CacheRegistry<String, u32> = CacheRegistry::new();
//! let a = registry.lfu("sessions", 16);
//! let b = registry.lfu("sessions", 999);
//!
//! assert!(Arc::ptr_eq(&a, &b));
//! assert_eq!(b.capacity(), 16);
//! ```

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::policy::lfu::LfuCache;

pub struct CacheRegistry<K, V> {
    caches: RwLock<FxHashMap<String, Arc<LfuCache<K, V>>>>,
}

impl<K, V> CacheRegistry<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self {
            caches: RwLock::new(FxHashMap::default()),
        }
    }

    /// Returns the cache called `name`, creating it with `capacity` if absent.
    ///
    /// `capacity` is ignored when the cache already exists. Concurrent callers
    /// with the same name all receive the same instance.
    pub fn lfu(&self, name: &str, capacity: usize) -> Arc<LfuCache<K, V>> {
        if let Some(cache) = self.caches.read().get(name) {
            return Arc::clone(cache);
        }

        let mut caches = self.caches.write();
        if let Some(cache) = caches.get(name) {
            return Arc::clone(cache);
        }

        let cache = Arc::new(LfuCache::new(name, capacity));
        caches.insert(name.to_owned(), Arc::clone(&cache));
        debug!(cache = %name, capacity, "registered cache");
        cache
    }

    pub fn get(&self, name: &str) -> Option<Arc<LfuCache<K, V>>> {
        self.caches.read().get(name).cloned()
    }

    /// Unregisters `name`. Handles already given out keep working.
    pub fn remove(&self, name: &str) -> Option<Arc<LfuCache<K, V>>> {
        let removed = self.caches.write().remove(name);
        if removed.is_some() {
            debug!(cache = %name, "unregistered cache");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl<K, V> Default for CacheRegistry<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Debug for CacheRegistry<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("caches", &caches.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn get_or_create_returns_same_instance() {
        let registry: CacheRegistry<u32, u32> = CacheRegistry::new();
        let first = registry.lfu("a", 4);
        first.insert(1, Duration::ZERO, 1);

        let again = registry.lfu("a", 100);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.capacity(), 4);
        assert!(again.exists(&1));
    }

    #[test]
    fn distinct_names_are_distinct_caches() {
        let registry: CacheRegistry<u32, u32> = CacheRegistry::new();
        let a = registry.lfu("a", 4);
        let b = registry.lfu("b", 4);
        a.insert(1, Duration::ZERO, 1);
        assert!(!b.exists(&1));
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn get_does_not_create() {
        let registry: CacheRegistry<u32, u32> = CacheRegistry::new();
        assert!(registry.get("missing").is_none());
        assert!(registry.is_empty());
        registry.lfu("present", 1);
        assert_eq!(registry.get("present").map(|c| c.name().to_string()), Some("present".into()));
    }

    #[test]
    fn remove_detaches_but_handles_survive() {
        let registry: CacheRegistry<u32, u32> = CacheRegistry::new();
        let handle = registry.lfu("a", 2);
        handle.insert(1, Duration::ZERO, 1);

        let removed = registry.remove("a").expect("registered");
        assert!(Arc::ptr_eq(&handle, &removed));
        assert!(registry.get("a").is_none());
        assert!(handle.exists(&1));
        assert!(registry.remove("a").is_none());

        let fresh = registry.lfu("a", 2);
        assert!(!fresh.exists(&1));
    }
}
